//! Task identifiers
//!
//! Task IDs are positive integers assigned by the store at creation time.
//! They are never reused and never change for the lifetime of a task.
//! Zero is reserved as "no id supplied" by callers that receive loose
//! integers (e.g. tool calls produced by an intent classifier).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid task ID: expected a positive integer, got '{0}'")]
    InvalidTaskId(String),
}

/// Task ID, a positive integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct TaskId(NonZeroU64);

impl TaskId {
    /// Creates a task ID, or `None` for zero
    pub fn new(value: u64) -> Option<Self> {
        NonZeroU64::new(value).map(Self)
    }

    /// Returns the numeric value
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // Accept "#3" as spoken/written by users
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);

        digits
            .parse::<u64>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| IdError::InvalidTaskId(s.to_string()))
    }
}

impl TryFrom<u64> for TaskId {
    type Error = IdError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| IdError::InvalidTaskId(value.to_string()))
    }
}

impl TryFrom<i64> for TaskId {
    type Error = IdError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| IdError::InvalidTaskId(value.to_string()))
    }
}

impl From<TaskId> for u64 {
    fn from(id: TaskId) -> Self {
        id.get()
    }
}
