//! Task tools
//!
//! The five operations a voice or chat assistant can invoke. Each tool
//! validates its loose arguments, resolves dates and task references, and
//! touches the store at most once for writes. Results render as the short
//! sentences the assistant speaks back.

use std::fmt;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::intent::Intent;
use crate::domain::{
    date, reference, Category, Clock, DateError, Lookup, NewTask, OrdinalPolicy, Priority,
    ReferenceError, Task, TaskFieldError, TaskPatch, TaskReference,
};
use crate::storage::{StoreError, TaskStore};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Task title cannot be empty.")]
    EmptyTitle,

    #[error("New title cannot be empty.")]
    EmptyNewTitle,

    #[error("Search query cannot be empty.")]
    EmptyQuery,

    #[error(transparent)]
    InvalidField(#[from] TaskFieldError),

    #[error("Could not parse scheduled time '{input}'. Please use formats like 'tomorrow', 'today', '2024-12-25', or 'next week'.")]
    BadSchedule {
        input: String,
        #[source]
        source: DateError,
    },

    #[error("No update fields provided.")]
    NoChanges,

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ToolError {
    /// The sentence spoken back to the user
    ///
    /// Lookups that simply found nothing read as plain answers; everything
    /// else is prefixed with `Error:`.
    pub fn reply(&self) -> String {
        match self {
            ToolError::NoChanges
            | ToolError::Reference(ReferenceError::NotFound(_) | ReferenceError::NeedsClarification) => {
                self.to_string()
            }
            _ => format!("Error: {self}"),
        }
    }
}

/// Store failures during lookup are reported as store failures
fn reference_failure(e: ReferenceError) -> ToolError {
    match e {
        ReferenceError::Store(store) => ToolError::Store(store),
        other => ToolError::Reference(other),
    }
}

/// Successful tool result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ToolOutput {
    Listed {
        #[serde(skip_serializing_if = "Option::is_none")]
        category: Option<Category>,
        tasks: Vec<Task>,
    },
    Created {
        task: Task,
    },
    Updated {
        task: Task,
    },
    Deleted {
        task: Task,
    },
    Found {
        query: String,
        tasks: Vec<Task>,
    },
}

impl fmt::Display for ToolOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolOutput::Listed { category, tasks } if tasks.is_empty() => {
                write!(f, "No tasks found.")?;
                if let Some(category) = category {
                    write!(f, " (category: {category})")?;
                }
                Ok(())
            }
            ToolOutput::Listed { tasks, .. } => {
                write!(f, "Found {} task(s):", tasks.len())?;
                for (i, task) in tasks.iter().enumerate() {
                    write!(f, "\n{}. ", i + 1)?;
                    write_task_line(f, task, true)?;
                }
                Ok(())
            }
            ToolOutput::Created { task } => {
                write!(f, "Created task: '{}' (ID: {})", task.title, task.id)
            }
            ToolOutput::Updated { task } => {
                write!(f, "Updated task ID {}: '{}'", task.id, task.title)
            }
            ToolOutput::Deleted { task } => {
                write!(f, "Deleted task: '{}' (ID: {})", task.title, task.id)
            }
            ToolOutput::Found { query, tasks } if tasks.is_empty() => {
                write!(f, "No tasks found matching '{query}'.")
            }
            ToolOutput::Found { query, tasks } => {
                write!(f, "Found {} task(s) matching '{query}':", tasks.len())?;
                for (i, task) in tasks.iter().enumerate() {
                    write!(f, "\n{}. ", i + 1)?;
                    write_task_line(f, task, false)?;
                }
                Ok(())
            }
        }
    }
}

/// `[id] title (Category: c) [Priority: HIGH] (Scheduled: 2025-03-11 15:00)`
fn write_task_line(f: &mut fmt::Formatter<'_>, task: &Task, detailed: bool) -> fmt::Result {
    write!(f, "[{}] {}", task.id, task.title)?;
    if let Some(category) = task.category {
        write!(f, " (Category: {category})")?;
    }
    if !detailed {
        return Ok(());
    }
    if task.priority != Priority::Medium {
        write!(f, " [Priority: {}]", task.priority.as_str().to_uppercase())?;
    }
    if let Some(at) = task.scheduled_time {
        write!(f, " (Scheduled: {})", at.format("%Y-%m-%d %H:%M"))?;
    }
    Ok(())
}

/// Tool runner bound to a store and a clock
pub struct Toolbox<'a, S: TaskStore + ?Sized> {
    store: &'a mut S,
    clock: &'a dyn Clock,
    policy: OrdinalPolicy,
}

impl<'a, S: TaskStore + ?Sized> Toolbox<'a, S> {
    pub fn new(store: &'a mut S, clock: &'a dyn Clock) -> Self {
        Self {
            store,
            clock,
            policy: OrdinalPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: OrdinalPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Runs one tool call
    pub fn execute(&mut self, intent: Intent) -> Result<ToolOutput, ToolError> {
        debug!(tool = intent.tool_name(), "executing tool call");

        match intent {
            Intent::ListTasks { category } => self.list_tasks(category.as_deref()),
            Intent::CreateTask {
                title,
                priority,
                scheduled_time,
                category,
            } => self.create_task(
                &title,
                priority.as_deref(),
                scheduled_time.as_deref(),
                category.as_deref(),
            ),
            Intent::UpdateTask {
                task_id,
                task_title,
                task_number,
                new_title,
                priority,
                scheduled_time,
                category,
            } => {
                let target = TaskReference::from_parts(task_id, task_title.as_deref(), task_number);
                let changes = UpdateArgs {
                    new_title: new_title.as_deref(),
                    priority: priority.as_deref(),
                    scheduled_time: scheduled_time.as_deref(),
                    category: category.as_deref(),
                };
                self.update_task(&target, changes)
            }
            Intent::DeleteTask {
                task_id,
                task_title,
                task_number,
            } => {
                let target = TaskReference::from_parts(task_id, task_title.as_deref(), task_number);
                self.delete_task(&target)
            }
            Intent::SearchTasks { query } => self.search_tasks(&query),
        }
    }

    /// Lists all tasks, optionally of one category
    pub fn list_tasks(&self, category: Option<&str>) -> Result<ToolOutput, ToolError> {
        let category = present(category).map(str::parse::<Category>).transpose()?;
        let tasks = self.store.list(category)?;
        Ok(ToolOutput::Listed { category, tasks })
    }

    /// Creates a task; an unrecognised priority falls back to medium
    pub fn create_task(
        &mut self,
        title: &str,
        priority: Option<&str>,
        scheduled_time: Option<&str>,
        category: Option<&str>,
    ) -> Result<ToolOutput, ToolError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ToolError::EmptyTitle);
        }

        let mut new = NewTask::new(title)
            .with_priority(present(priority).map(Priority::parse_or_default).unwrap_or_default());
        if let Some(category) = present(category) {
            new = new.with_category(category.parse()?);
        }
        if let Some(expr) = present(scheduled_time) {
            new = new.with_scheduled_time(self.schedule(expr)?);
        }

        let created_at = self.clock.now().with_timezone(&Utc);
        let task = self.store.create(new, created_at)?;
        info!(id = %task.id, title = %task.title, "created task");
        Ok(ToolOutput::Created { task })
    }

    /// Applies changes to the referenced task
    pub fn update_task(
        &mut self,
        target: &TaskReference,
        changes: UpdateArgs<'_>,
    ) -> Result<ToolOutput, ToolError> {
        let id = reference::resolve(&*self.store, target, self.policy).map_err(reference_failure)?;

        let mut patch = TaskPatch::default();
        if let Some(new_title) = changes.new_title.filter(|t| !t.is_empty()) {
            let new_title = new_title.trim();
            if new_title.is_empty() {
                return Err(ToolError::EmptyNewTitle);
            }
            patch.title = Some(new_title.to_string());
        }
        if let Some(priority) = present(changes.priority) {
            patch.priority = Some(priority.parse()?);
        }
        if let Some(expr) = present(changes.scheduled_time) {
            patch.scheduled_time = Some(self.schedule(expr)?);
        }
        if let Some(category) = present(changes.category) {
            patch.category = Some(category.parse()?);
        }

        if patch.is_empty() {
            return Err(ToolError::NoChanges);
        }

        let task = self
            .store
            .update(id, &patch)?
            .ok_or(ReferenceError::NotFound(Lookup::Id(id)))?;
        info!(id = %task.id, title = %task.title, "updated task");
        Ok(ToolOutput::Updated { task })
    }

    /// Deletes the referenced task
    pub fn delete_task(&mut self, target: &TaskReference) -> Result<ToolOutput, ToolError> {
        let id = reference::resolve(&*self.store, target, self.policy).map_err(reference_failure)?;

        let task = self
            .store
            .get(id)?
            .ok_or(ReferenceError::NotFound(Lookup::Id(id)))?;
        if !self.store.delete(id)? {
            return Err(ReferenceError::NotFound(Lookup::Id(id)).into());
        }

        info!(id = %task.id, title = %task.title, "deleted task");
        Ok(ToolOutput::Deleted { task })
    }

    /// Searches titles and categories
    pub fn search_tasks(&self, query: &str) -> Result<ToolOutput, ToolError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ToolError::EmptyQuery);
        }

        let tasks = self.store.search(query)?;
        Ok(ToolOutput::Found {
            query: query.to_string(),
            tasks,
        })
    }

    fn schedule(&self, expr: &str) -> Result<chrono::DateTime<chrono::FixedOffset>, ToolError> {
        date::resolve(expr, &self.clock.now()).map_err(|source| {
            warn!(input = expr, error = %source, "rejected scheduled time");
            ToolError::BadSchedule {
                input: expr.to_string(),
                source,
            }
        })
    }
}

/// Requested changes for [`Toolbox::update_task`]; `None` or blank leaves a field alone
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateArgs<'a> {
    pub new_title: Option<&'a str>,
    pub priority: Option<&'a str>,
    pub scheduled_time: Option<&'a str>,
    pub category: Option<&'a str>,
}

/// Treats blank strings as absent
fn present(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FixedClock, TaskId};
    use crate::storage::MemoryStore;
    use chrono::{DateTime, FixedOffset};

    /// Monday 2025-03-10 08:30 at +01:00
    fn clock() -> FixedClock {
        FixedClock(DateTime::parse_from_rfc3339("2025-03-10T08:30:00+01:00").unwrap())
    }

    fn run(store: &mut MemoryStore, json: &str) -> Result<ToolOutput, ToolError> {
        let clock = clock();
        Toolbox::new(store, &clock).execute(Intent::from_json(json).unwrap())
    }

    fn reply(store: &mut MemoryStore, json: &str) -> String {
        match run(store, json) {
            Ok(out) => out.to_string(),
            Err(e) => e.reply(),
        }
    }

    fn seeded() -> MemoryStore {
        let mut store = MemoryStore::new();
        reply(&mut store, r#"{"tool": "create_task", "args": {"title": "Buy milk", "category": "shop"}}"#);
        reply(
            &mut store,
            r#"{"tool": "create_task", "args": {"title": "File taxes", "priority": "high", "category": "admin", "scheduled_time": "tomorrow at 3pm"}}"#,
        );
        store
    }

    #[test]
    fn create_replies_with_id() {
        let mut store = MemoryStore::new();
        let out = reply(&mut store, r#"{"tool": "create_task", "args": {"title": "  Buy milk "}}"#);
        assert_eq!(out, "Created task: 'Buy milk' (ID: 1)");

        let task = store.get(TaskId::new(1).unwrap()).unwrap().unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.created_at, clock().0.with_timezone(&Utc));
    }

    #[test]
    fn create_resolves_schedule_in_clock_offset() {
        let store = seeded();
        let task = store.get(TaskId::new(2).unwrap()).unwrap().unwrap();
        let expected = DateTime::parse_from_rfc3339("2025-03-11T15:00:00+01:00").unwrap();
        assert_eq!(task.scheduled_time, Some(expected));
        assert_eq!(task.scheduled_time.unwrap().offset(), &FixedOffset::east_opt(3600).unwrap());
        assert_eq!(task.category, Some(Category::Administrative));
        assert_eq!(task.priority, Priority::High);
    }

    #[test]
    fn create_unknown_priority_is_medium() {
        let mut store = MemoryStore::new();
        run(&mut store, r#"{"tool": "create_task", "args": {"title": "x", "priority": "urgent"}}"#).unwrap();
        assert_eq!(store.list(None).unwrap()[0].priority, Priority::Medium);
    }

    #[test]
    fn create_rejects_empty_title() {
        let mut store = MemoryStore::new();
        let out = reply(&mut store, r#"{"tool": "create_task", "args": {"title": "   "}}"#);
        assert_eq!(out, "Error: Task title cannot be empty.");
        assert!(store.is_empty());
    }

    #[test]
    fn create_rejects_bad_category() {
        let mut store = MemoryStore::new();
        let out = reply(&mut store, r#"{"tool": "create_task", "args": {"title": "x", "category": "errands"}}"#);
        assert_eq!(
            out,
            "Error: Invalid category 'errands'. Must be one of: work, personal, administrative, shopping."
        );
        assert!(store.is_empty());
    }

    #[test]
    fn create_with_time_complaint_stores_nothing() {
        let mut store = MemoryStore::new();
        let err = run(
            &mut store,
            r#"{"tool": "create_task", "args": {"title": "x", "scheduled_time": "the time is wrong"}}"#,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ToolError::BadSchedule {
                source: DateError::NotADateStatement(_),
                ..
            }
        ));
        assert_eq!(
            err.reply(),
            "Error: Could not parse scheduled time 'the time is wrong'. Please use formats like 'tomorrow', 'today', '2024-12-25', or 'next week'."
        );
        assert!(store.is_empty());
    }

    #[test]
    fn list_formats_lines() {
        let mut store = seeded();
        let out = reply(&mut store, r#"{"tool": "list_tasks", "args": {}}"#);
        assert_eq!(
            out,
            "Found 2 task(s):\n\
             1. [2] File taxes (Category: administrative) [Priority: HIGH] (Scheduled: 2025-03-11 15:00)\n\
             2. [1] Buy milk (Category: shopping)"
        );
    }

    #[test]
    fn list_by_category() {
        let mut store = seeded();
        let out = reply(&mut store, r#"{"tool": "list_tasks", "args": {"category": "shopping"}}"#);
        assert_eq!(out, "Found 1 task(s):\n1. [1] Buy milk (Category: shopping)");

        let out = reply(&mut store, r#"{"tool": "list_tasks", "args": {"category": "work"}}"#);
        assert_eq!(out, "No tasks found. (category: work)");
    }

    #[test]
    fn list_empty() {
        let mut store = MemoryStore::new();
        assert_eq!(reply(&mut store, r#"{"tool": "list_tasks"}"#), "No tasks found.");
    }

    #[test]
    fn search_replies() {
        let mut store = seeded();
        assert_eq!(
            reply(&mut store, r#"{"tool": "search_tasks", "args": {"query": "milk"}}"#),
            "Found 1 task(s) matching 'milk':\n1. [1] Buy milk (Category: shopping)"
        );
        assert_eq!(
            reply(&mut store, r#"{"tool": "search_tasks", "args": {"query": "dentist"}}"#),
            "No tasks found matching 'dentist'."
        );
        assert_eq!(
            reply(&mut store, r#"{"tool": "search_tasks", "args": {"query": " "}}"#),
            "Error: Search query cannot be empty."
        );
    }

    #[test]
    fn update_by_title() {
        let mut store = seeded();
        let out = reply(
            &mut store,
            r#"{"tool": "update_task", "args": {"task_title": "milk", "priority": "low", "new_title": "Buy oat milk"}}"#,
        );
        assert_eq!(out, "Updated task ID 1: 'Buy oat milk'");

        let task = store.get(TaskId::new(1).unwrap()).unwrap().unwrap();
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.category, Some(Category::Shopping));
    }

    #[test]
    fn update_by_position() {
        let mut store = seeded();
        let out = reply(
            &mut store,
            r#"{"tool": "update_task", "args": {"task_number": 2, "category": "personal"}}"#,
        );
        assert_eq!(out, "Updated task ID 1: 'Buy milk'");
    }

    #[test]
    fn delete_by_number_as_id() {
        let mut store = seeded();
        let clock = clock();
        let out = Toolbox::new(&mut store, &clock)
            .with_policy(OrdinalPolicy::Id)
            .execute(Intent::DeleteTask {
                task_id: None,
                task_title: None,
                task_number: Some(2),
            })
            .unwrap();
        assert_eq!(out.to_string(), "Deleted task: 'File taxes' (ID: 2)");
    }

    #[test]
    fn update_without_changes() {
        let mut store = seeded();
        let out = reply(&mut store, r#"{"tool": "update_task", "args": {"task_id": 1, "priority": ""}}"#);
        assert_eq!(out, "No update fields provided.");
    }

    #[test]
    fn update_invalid_priority_is_error() {
        let mut store = seeded();
        let out = reply(&mut store, r#"{"tool": "update_task", "args": {"task_id": 1, "priority": "urgent"}}"#);
        assert_eq!(out, "Error: Invalid priority 'urgent'. Use 'low', 'medium', or 'high'.");
    }

    #[test]
    fn update_blank_new_title_is_error() {
        let mut store = seeded();
        let out = reply(&mut store, r#"{"tool": "update_task", "args": {"task_id": 1, "new_title": "   "}}"#);
        assert_eq!(out, "Error: New title cannot be empty.");
    }

    #[test]
    fn update_missing_task() {
        let mut store = seeded();
        assert_eq!(
            reply(&mut store, r#"{"tool": "update_task", "args": {"task_id": 9, "priority": "low"}}"#),
            "Task ID 9 not found."
        );
        assert_eq!(
            reply(&mut store, r#"{"tool": "update_task", "args": {"task_title": "dentist", "priority": "low"}}"#),
            "Task with title containing 'dentist' not found."
        );
        assert_eq!(
            reply(&mut store, r#"{"tool": "update_task", "args": {"priority": "low"}}"#),
            "Please specify a task ID, title, or number."
        );
    }

    #[test]
    fn update_rejected_schedule_leaves_task() {
        let mut store = seeded();
        let before = store.get(TaskId::new(1).unwrap()).unwrap();
        let err = run(
            &mut store,
            r#"{"tool": "update_task", "args": {"task_id": 1, "scheduled_time": "date is incorrect"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::BadSchedule { .. }));
        assert_eq!(store.get(TaskId::new(1).unwrap()).unwrap(), before);
    }

    #[test]
    fn delete_by_id_and_position() {
        let mut store = seeded();
        assert_eq!(
            reply(&mut store, r#"{"tool": "delete_task", "args": {"task_number": 1}}"#),
            "Deleted task: 'File taxes' (ID: 2)"
        );
        assert_eq!(
            reply(&mut store, r#"{"tool": "delete_task", "args": {"task_id": 1}}"#),
            "Deleted task: 'Buy milk' (ID: 1)"
        );
        assert!(store.is_empty());
        assert_eq!(
            reply(&mut store, r#"{"tool": "delete_task", "args": {"task_id": 1}}"#),
            "Task ID 1 not found."
        );
    }

    #[test]
    fn delete_position_out_of_range() {
        let mut store = seeded();
        assert_eq!(
            reply(&mut store, r#"{"tool": "delete_task", "args": {"task_number": 5}}"#),
            "Task number 5 not found."
        );
    }

    #[test]
    fn output_serializes_with_result_tag() {
        let mut store = MemoryStore::new();
        let out = run(&mut store, r#"{"tool": "create_task", "args": {"title": "x"}}"#).unwrap();
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["result"], "created");
        assert_eq!(json["task"]["id"], 1);
    }
}
