//! Task reference resolution
//!
//! A user may point at a task by ID ("task 3"), by list position ("the
//! second one") or by a fragment of its title ("the milk one"). This
//! module turns such a reference into a concrete [`TaskId`] that exists in
//! the store, without modifying the store.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::id::TaskId;
use crate::storage::{StoreError, TaskStore};

/// How a spoken ordinal ("task number 2") is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrdinalPolicy {
    /// 1-based position in the task list, newest first
    #[default]
    Position,

    /// The ordinal is the task ID
    Id,
}

impl OrdinalPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrdinalPolicy::Position => "position",
            OrdinalPolicy::Id => "id",
        }
    }
}

/// Partial reference to a task; any subset of fields may be present
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskReference {
    pub id: Option<TaskId>,
    pub title: Option<String>,
    pub ordinal: Option<u64>,
}

impl TaskReference {
    /// Builds a reference from loosely-typed inputs
    ///
    /// Zero IDs, zero ordinals and blank titles count as absent.
    pub fn from_parts(id: Option<u64>, title: Option<&str>, ordinal: Option<u64>) -> Self {
        Self {
            id: id.and_then(TaskId::new),
            title: title
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            ordinal: ordinal.filter(|n| *n > 0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.title.is_none() && self.ordinal.is_none()
    }
}

/// What a failed lookup was looking for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Id(TaskId),
    Title(String),
    Position(u64),
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Id(id) => write!(f, "Task ID {id} not found."),
            Lookup::Title(title) => write!(f, "Task with title containing '{title}' not found."),
            Lookup::Position(n) => write!(f, "Task number {n} not found."),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("{0}")]
    NotFound(Lookup),

    #[error("Please specify a task ID, title, or number.")]
    NeedsClarification,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Resolves `reference` to the ID of an existing task
///
/// Precedence: ordinal (when no ID is given), then ID, then title.
pub fn resolve<S: TaskStore + ?Sized>(
    store: &S,
    reference: &TaskReference,
    policy: OrdinalPolicy,
) -> Result<TaskId, ReferenceError> {
    let candidate = match (reference.ordinal, reference.id, &reference.title) {
        (Some(ordinal), None, _) => match policy {
            OrdinalPolicy::Position => by_position(store, ordinal)?,
            OrdinalPolicy::Id => TaskId::new(ordinal)
                .ok_or(ReferenceError::NotFound(Lookup::Position(ordinal)))?,
        },
        (_, Some(id), _) => id,
        (_, None, Some(title)) => store
            .search(title)?
            .first()
            .map(|task| task.id)
            .ok_or_else(|| ReferenceError::NotFound(Lookup::Title(title.clone())))?,
        (None, None, None) => return Err(ReferenceError::NeedsClarification),
    };

    if store.get(candidate)?.is_none() {
        return Err(ReferenceError::NotFound(Lookup::Id(candidate)));
    }

    debug!(id = %candidate, ?reference, policy = policy.as_str(), "resolved task reference");
    Ok(candidate)
}

fn by_position<S: TaskStore + ?Sized>(store: &S, ordinal: u64) -> Result<TaskId, ReferenceError> {
    let not_found = ReferenceError::NotFound(Lookup::Position(ordinal));
    let Some(index) = usize::try_from(ordinal).ok().and_then(|n| n.checked_sub(1)) else {
        return Err(not_found);
    };

    store
        .list(None)?
        .get(index)
        .map(|task| task.id)
        .ok_or(not_found)
}
