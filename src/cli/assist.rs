//! Assistant-facing commands: raw tool calls and date resolution

use std::io::Read;

use anyhow::{Context, Result};
use chrono::DateTime;

use super::output::Output;
use super::Reported;
use crate::agent::{Intent, Toolbox};
use crate::domain::{date, Clock, SystemClock};
use crate::storage::Project;

/// Runs one JSON tool call and prints the reply
///
/// Tool failures are answers too: the reply is printed and the command
/// exits non-zero.
pub fn dispatch(output: &Output, json: Option<&str>) -> Result<()> {
    let input = match json {
        Some(json) => json.to_string(),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read tool call from stdin")?;
            buf
        }
    };

    let intent = Intent::from_json(&input)?;
    let tool = intent.tool_name();

    let project = Project::open_current()?;
    let mut store = project.store()?;
    let clock = SystemClock;
    let result = Toolbox::new(&mut store, &clock)
        .with_policy(project.config().project.ordinal_policy)
        .execute(intent);

    match result {
        Ok(out) => {
            if output.is_json() {
                output.data(&serde_json::json!({
                    "success": true,
                    "tool": tool,
                    "reply": out.to_string(),
                    "output": out,
                }));
            } else {
                println!("{out}");
            }
            Ok(())
        }
        Err(e) => {
            if output.is_json() {
                output.error(&e.reply());
            } else {
                println!("{}", e.reply());
            }
            Err(anyhow::Error::new(e).context(Reported))
        }
    }
}

/// Resolves a date expression against `now` (RFC 3339) or the system clock
pub fn when(output: &Output, expression: &str, now: Option<&str>) -> Result<()> {
    let now = match now {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("Invalid --now timestamp '{s}', expected RFC 3339"))?,
        None => SystemClock.now(),
    };

    let resolved = date::resolve(expression, &now)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "expression": expression,
            "now": now.to_rfc3339(),
            "resolved": resolved.to_rfc3339(),
        }));
    } else {
        println!("{}", resolved.to_rfc3339());
    }

    Ok(())
}
