//! Domain models for voice-todo
//!
//! Tasks, the natural-language date resolver and task reference
//! resolution. Nothing here touches the filesystem.

mod clock;
pub mod date;
mod id;
pub mod reference;
mod task;

pub use clock::{Clock, FixedClock, SystemClock};
pub use date::DateError;
pub use id::{IdError, TaskId};
pub use reference::{Lookup, OrdinalPolicy, ReferenceError, TaskReference};
pub use task::{Category, NewTask, Priority, Task, TaskFieldError, TaskPatch};
