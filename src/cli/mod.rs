//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project management | `init` |
//! | Task | Work item management | `add`, `list`, `update`, `delete`, `search` |
//! | Assistant | Tool calls and dates | `dispatch`, `when` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! The default can be changed with `default_format` in the global config.
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output, or set `RUST_LOG`:
//! ```bash
//! todo --verbose when "next friday at 3pm"
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

use std::fmt;

mod app;
mod assist;
mod logging;
mod output;
mod task;

pub use app::{Cli, Commands, run};
pub use output::{Output, OutputFormat};

/// Marks an error whose message has already been printed
///
/// `main` exits non-zero without printing it a second time.
#[derive(Debug, Clone, Copy)]
pub struct Reported;

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("error already reported")
    }
}
