//! The task store contract
//!
//! Every backend keeps the same ordering rules so that "task number 2"
//! means the same task regardless of where tasks live.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{Category, NewTask, Task, TaskId, TaskPatch};

/// Maximum number of search hits returned when not configured otherwise
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Corrupt task record {id}: {reason}")]
    Corrupt { id: i64, reason: String },
}

/// Persistent collection of tasks
///
/// Implementations assign IDs on [`create`](TaskStore::create); IDs are
/// positive, unique and never reused within a store.
pub trait TaskStore {
    /// Fetches one task
    fn get(&self, id: TaskId) -> Result<Option<Task>, StoreError>;

    /// All tasks (optionally of one category), newest first, ties by ID descending
    fn list(&self, category: Option<Category>) -> Result<Vec<Task>, StoreError>;

    /// Tasks matching `query`, best match first
    ///
    /// Tiers: exact title, title prefix, title substring, category name
    /// substring. All comparisons are case-insensitive and each tier is
    /// ordered like [`list`](TaskStore::list).
    fn search(&self, query: &str) -> Result<Vec<Task>, StoreError>;

    /// Stores a new task and returns it with its assigned ID
    fn create(&mut self, new: NewTask, created_at: DateTime<Utc>) -> Result<Task, StoreError>;

    /// Applies a partial update, returning the updated task or `None` if absent
    fn update(&mut self, id: TaskId, patch: &TaskPatch) -> Result<Option<Task>, StoreError>;

    /// Removes a task, returning whether it existed
    fn delete(&mut self, id: TaskId) -> Result<bool, StoreError>;
}

/// Listing order shared by all stores
pub(crate) fn newest_first(a: &Task, b: &Task) -> Ordering {
    b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
}

/// Search tier of `task` for an already lower-cased query, `None` if it does not match
pub(crate) fn search_tier(task: &Task, query: &str) -> Option<u8> {
    let title = task.title.to_lowercase();

    if title == query {
        Some(0)
    } else if title.starts_with(query) {
        Some(1)
    } else if title.contains(query) {
        Some(2)
    } else if task.category.is_some_and(|c| c.as_str().contains(query)) {
        Some(3)
    } else {
        None
    }
}
