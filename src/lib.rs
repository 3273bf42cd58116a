//! Voice Todo - natural-language task management
//!
//! Tasks live in a per-project SQLite database and are driven either from
//! the `todo` CLI or by an assistant issuing JSON tool calls. Relative dates
//! ("next friday at 3pm") and loose task references ("the second one",
//! "the milk task") are resolved into concrete values before they reach
//! storage.

pub mod agent;
pub mod cli;
pub mod domain;
pub mod storage;

pub use agent::{Intent, Toolbox, ToolError, ToolOutput};
pub use domain::{Category, NewTask, Priority, Task, TaskId, TaskReference};
pub use storage::{MemoryStore, SqliteStore, TaskStore};
