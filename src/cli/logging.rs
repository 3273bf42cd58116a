//! Diagnostic logging
//!
//! Library code emits `tracing` events; the CLI decides where they go.
//! Logs are written to stderr so stdout stays clean for command output.

use tracing_subscriber::{prelude::*, EnvFilter};

/// Installs the global subscriber
///
/// `RUST_LOG` wins when set. Otherwise only warnings are shown, or
/// everything from this crate down to `debug` with `--verbose`.
/// Safe to call more than once.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("warn,voice_todo=debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose),
        )
        .try_init();
}
