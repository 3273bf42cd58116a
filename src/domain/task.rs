//! Task domain model
//!
//! A task is a single to-do item with a priority, an optional category and
//! an optional scheduled time. Tasks are owned by a [`crate::storage::TaskStore`];
//! everything here is plain data plus parsing of the loose words an intent
//! classifier hands us ("high", "admin", ...).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::TaskId;

#[derive(Debug, Error, PartialEq)]
pub enum TaskFieldError {
    #[error("Invalid priority '{0}'. Use 'low', 'medium', or 'high'.")]
    InvalidPriority(String),

    #[error("Invalid category '{0}'. Must be one of: work, personal, administrative, shopping.")]
    InvalidCategory(String),
}

/// Priority of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Parses a priority word, falling back to [`Priority::Medium`] for
    /// anything unrecognised
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TaskFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(TaskFieldError::InvalidPriority(s.to_string())),
        }
    }
}

/// Fixed set of task categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Work,
    Personal,
    Administrative,
    Shopping,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Work,
        Category::Personal,
        Category::Administrative,
        Category::Shopping,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Administrative => "administrative",
            Category::Shopping => "shopping",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TaskFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "work" => Ok(Category::Work),
            "personal" => Ok(Category::Personal),
            "administrative" | "admin" => Ok(Category::Administrative),
            "shopping" | "shop" => Ok(Category::Shopping),
            _ => Err(TaskFieldError::InvalidCategory(s.to_string())),
        }
    }
}

/// A stored task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, assigned by the store
    pub id: TaskId,

    /// Human-readable title
    pub title: String,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,

    /// When the task is scheduled, in the offset the user meant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<DateTime<FixedOffset>>,

    /// When the task was created (immutable)
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Materializes a new task under the given ID
    pub fn from_new(id: TaskId, new: NewTask, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: new.title,
            priority: new.priority,
            category: new.category,
            scheduled_time: new.scheduled_time,
            created_at,
        }
    }

    /// Applies a partial update in place; `id` and `created_at` are untouched
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(category) = patch.category {
            self.category = Some(category);
        }
        if let Some(scheduled) = patch.scheduled_time {
            self.scheduled_time = Some(scheduled);
        }
    }
}

/// Fields for a task that does not exist yet
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewTask {
    pub title: String,
    pub priority: Priority,
    pub category: Option<Category>,
    pub scheduled_time: Option<DateTime<FixedOffset>>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_scheduled_time(mut self, at: DateTime<FixedOffset>) -> Self {
        self.scheduled_time = Some(at);
        self
    }
}

/// Partial update; `None` leaves a field unchanged
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub scheduled_time: Option<DateTime<FixedOffset>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.priority.is_none()
            && self.category.is_none()
            && self.scheduled_time.is_none()
    }
}
