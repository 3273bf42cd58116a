//! # Assistant tools
//!
//! The surface a voice or chat assistant talks to: a tagged [`Intent`]
//! (tool call) goes in, a [`ToolOutput`] or [`ToolError`] comes out, and
//! both render as the sentence to speak back.
//!
//! | Tool | Arguments |
//! |------|-----------|
//! | `list_tasks` | `category?` |
//! | `create_task` | `title`, `priority?`, `scheduled_time?`, `category?` |
//! | `update_task` | `task_id?`, `task_title?`, `task_number?`, `new_title?`, `priority?`, `scheduled_time?`, `category?` |
//! | `delete_task` | `task_id?`, `task_title?`, `task_number?` |
//! | `search_tasks` | `query` |

mod intent;
mod tools;

pub use intent::{Intent, IntentError};
pub use tools::{Toolbox, ToolError, ToolOutput, UpdateArgs};
