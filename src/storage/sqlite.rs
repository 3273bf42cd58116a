//! SQLite task store
//!
//! Tasks live in `.todo/tasks.db`. IDs come from an `AUTOINCREMENT`
//! primary key so a deleted task's ID is never handed out again.
//! Timestamps are stored as fixed-width RFC 3339 text, which keeps
//! `ORDER BY created_at` chronological.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::store::{StoreError, TaskStore, DEFAULT_SEARCH_LIMIT};
use crate::domain::{Category, NewTask, Priority, Task, TaskId, TaskPatch};

const TASK_COLUMNS: &str = "id, title, priority, category, scheduled_time, created_at";

/// SQLite-backed [`TaskStore`]
pub struct SqliteStore {
    /// Path to the SQLite database
    db_path: PathBuf,

    /// Database connection
    conn: Connection,

    search_limit: usize,
}

impl SqliteStore {
    /// Schema version - bump when the schema changes
    const SCHEMA_VERSION: i32 = 1;

    /// Opens or creates the database at `db_path`
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open task database: {}", db_path.display()))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        register_fold_case(&conn)?;

        let mut store = Self {
            db_path,
            conn,
            search_limit: DEFAULT_SEARCH_LIMIT,
        };

        store
            .ensure_schema()
            .with_context(|| format!("Failed to prepare schema in {}", store.db_path.display()))?;

        Ok(store)
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    /// Returns the database path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn ensure_schema(&mut self) -> Result<(), StoreError> {
        let current_version = self.schema_version()?;

        // Version 0 is a fresh file; anything else unknown is left alone
        // rather than dropped, since this database is the source of truth.
        if current_version == 0 {
            self.create_schema()?;
        }

        Ok(())
    }

    fn schema_version(&self) -> Result<i32, StoreError> {
        let result: Option<i32> = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .optional()?;

        Ok(result.unwrap_or(0))
    }

    fn create_schema(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                priority TEXT NOT NULL,
                category TEXT,
                scheduled_time TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_created ON tasks(created_at);
            CREATE INDEX IF NOT EXISTS idx_tasks_category ON tasks(category);
            ",
        )?;

        self.conn.execute(
            &format!("PRAGMA user_version = {}", Self::SCHEMA_VERSION),
            [],
        )?;

        Ok(())
    }

    fn query_tasks(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Task>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, RawTask::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(RawTask::into_task).collect()
    }
}

impl TaskStore for SqliteStore {
    fn get(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id_param(id)],
                RawTask::from_row,
            )
            .optional()?;

        raw.map(RawTask::into_task).transpose()
    }

    fn list(&self, category: Option<Category>) -> Result<Vec<Task>, StoreError> {
        match category {
            Some(category) => self.query_tasks(
                &format!(
                    "SELECT {TASK_COLUMNS} FROM tasks WHERE category = ?1
                     ORDER BY created_at DESC, id DESC"
                ),
                params![category.as_str()],
            ),
            None => self.query_tasks(
                &format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC, id DESC"),
                [],
            ),
        }
    }

    fn search(&self, query: &str) -> Result<Vec<Task>, StoreError> {
        let query = query.trim().to_lowercase();
        let escaped = escape_like(&query);
        let limit = i64::try_from(self.search_limit).unwrap_or(i64::MAX);

        self.query_tasks(
            &format!(
                "SELECT {TASK_COLUMNS},
                    CASE
                        WHEN fold_case(title) = ?1 THEN 0
                        WHEN fold_case(title) LIKE ?2 ESCAPE '\\' THEN 1
                        WHEN fold_case(title) LIKE ?3 ESCAPE '\\' THEN 2
                        ELSE 3
                    END AS tier
                 FROM tasks
                 WHERE fold_case(title) LIKE ?3 ESCAPE '\\'
                    OR coalesce(category, '') LIKE ?3 ESCAPE '\\'
                 ORDER BY tier, created_at DESC, id DESC
                 LIMIT ?4"
            ),
            params![query, format!("{escaped}%"), format!("%{escaped}%"), limit],
        )
    }

    fn create(&mut self, new: NewTask, created_at: DateTime<Utc>) -> Result<Task, StoreError> {
        self.conn.execute(
            "INSERT INTO tasks (title, priority, category, scheduled_time, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                new.title,
                new.priority.as_str(),
                new.category.map(|c| c.as_str()),
                new.scheduled_time.map(|t| t.to_rfc3339()),
                timestamp(&created_at),
            ],
        )?;

        let rowid = self.conn.last_insert_rowid();
        let id = TaskId::try_from(rowid).map_err(|e| StoreError::Corrupt {
            id: rowid,
            reason: e.to_string(),
        })?;

        // Round-trip through the stored text so the returned task equals a later `get`
        let created_at = parse_created_at(rowid, &timestamp(&created_at))?;
        Ok(Task::from_new(id, new, created_at))
    }

    fn update(&mut self, id: TaskId, patch: &TaskPatch) -> Result<Option<Task>, StoreError> {
        let changed = self.conn.execute(
            "UPDATE tasks SET
                title = COALESCE(?2, title),
                priority = COALESCE(?3, priority),
                category = COALESCE(?4, category),
                scheduled_time = COALESCE(?5, scheduled_time)
             WHERE id = ?1",
            params![
                id_param(id),
                patch.title,
                patch.priority.map(|p| p.as_str()),
                patch.category.map(|c| c.as_str()),
                patch.scheduled_time.map(|t| t.to_rfc3339()),
            ],
        )?;

        if changed == 0 {
            return Ok(None);
        }
        self.get(id)
    }

    fn delete(&mut self, id: TaskId) -> Result<bool, StoreError> {
        let removed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id_param(id)])?;
        Ok(removed > 0)
    }
}

/// Row as stored, before field validation
struct RawTask {
    id: i64,
    title: String,
    priority: String,
    category: Option<String>,
    scheduled_time: Option<String>,
    created_at: String,
}

impl RawTask {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            priority: row.get(2)?,
            category: row.get(3)?,
            scheduled_time: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn into_task(self) -> Result<Task, StoreError> {
        let id = self.id;
        let corrupt = |reason: String| StoreError::Corrupt { id, reason };

        let task_id = TaskId::try_from(id).map_err(|e| corrupt(e.to_string()))?;
        let priority = self
            .priority
            .parse::<Priority>()
            .map_err(|e| corrupt(e.to_string()))?;
        let category = self
            .category
            .map(|c| c.parse::<Category>())
            .transpose()
            .map_err(|e| corrupt(e.to_string()))?;
        let scheduled_time = self
            .scheduled_time
            .map(|s| DateTime::parse_from_rfc3339(&s))
            .transpose()
            .map_err(|e| corrupt(format!("bad scheduled_time: {e}")))?;
        let created_at = parse_created_at(id, &self.created_at)?;

        Ok(Task {
            id: task_id,
            title: self.title,
            priority,
            category,
            scheduled_time,
            created_at,
        })
    }
}

fn id_param(id: TaskId) -> i64 {
    // IDs originate from SQLite rowids, which are i64
    i64::try_from(id.get()).unwrap_or(i64::MAX)
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_created_at(id: i64, s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt {
            id,
            reason: format!("bad created_at: {e}"),
        })
}

/// Registers `fold_case(text)`, Unicode lower-casing as done by
/// [`str::to_lowercase`]
///
/// SQLite's own `lower()` and `LIKE` only fold ASCII, which would make
/// `Émile` unreachable by the query `émile`.
fn register_fold_case(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase())),
    )
}

/// Escapes LIKE wildcards so user text matches literally
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, TimeZone};
    use tempfile::TempDir;

    fn setup() -> (TempDir, SqliteStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path().join(".todo").join("tasks.db")).unwrap();
        (dir, store)
    }

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap() + Duration::minutes(minute)
    }

    #[test]
    fn creates_database_file() {
        let (dir, store) = setup();
        assert!(store.path().is_file());
        assert!(dir.path().join(".todo").is_dir());
    }

    #[test]
    fn schema_version_is_set() {
        let (_dir, store) = setup();
        assert_eq!(store.schema_version().unwrap(), SqliteStore::SCHEMA_VERSION);
    }

    #[test]
    fn create_then_get() {
        let (_dir, mut store) = setup();
        let when = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 1, 2, 15, 0, 0)
            .unwrap();

        let created = store
            .create(
                NewTask::new("Buy milk")
                    .with_priority(Priority::High)
                    .with_category(Category::Shopping)
                    .with_scheduled_time(when),
                at(0),
            )
            .unwrap();

        assert_eq!(created.id.get(), 1);
        let fetched = store.get(created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.scheduled_time.unwrap().offset(), when.offset());
    }

    #[test]
    fn ids_never_reused() {
        let (_dir, mut store) = setup();
        store.create(NewTask::new("one"), at(0)).unwrap();
        let two = store.create(NewTask::new("two"), at(1)).unwrap();
        assert!(store.delete(two.id).unwrap());

        let three = store.create(NewTask::new("three"), at(2)).unwrap();
        assert_eq!(three.id.get(), 3);
    }

    #[test]
    fn reopen_keeps_tasks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.db");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.create(NewTask::new("persisted"), at(0)).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        let tasks = store.list(None).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "persisted");
    }

    #[test]
    fn list_order_and_filter() {
        let (_dir, mut store) = setup();
        store.create(NewTask::new("a").with_category(Category::Work), at(0)).unwrap();
        store.create(NewTask::new("b"), at(5)).unwrap();
        store.create(NewTask::new("c").with_category(Category::Work), at(5)).unwrap();

        let titles: Vec<String> = store.list(None).unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["c", "b", "a"]);

        let work: Vec<String> = store
            .list(Some(Category::Work))
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(work, vec!["c", "a"]);
    }

    #[test]
    fn search_tiers_and_limit() {
        let (_dir, mut store) = setup();
        store.create(NewTask::new("Buy milk"), at(0)).unwrap();
        store.create(NewTask::new("Milk the cows"), at(1)).unwrap();
        store.create(NewTask::new("Taxes").with_category(Category::Administrative), at(2)).unwrap();
        store.create(NewTask::new("buy MILK"), at(3)).unwrap();

        let titles: Vec<String> = store.search("Buy Milk").unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["buy MILK", "Buy milk"]);

        let titles: Vec<String> = store.search("milk").unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["Milk the cows", "buy MILK", "Buy milk"]);

        let admin = store.search("admin").unwrap();
        assert_eq!(admin.len(), 1);
        assert_eq!(admin[0].title, "Taxes");

        let limited = store.with_search_limit(1);
        assert_eq!(limited.search("milk").unwrap().len(), 1);
    }

    #[test]
    fn search_folds_non_ascii_case_like_memory_store() {
        use crate::domain::{reference, OrdinalPolicy, TaskReference};
        use crate::storage::MemoryStore;

        let (_dir, mut sqlite) = setup();
        let mut memory = MemoryStore::new();
        for (i, title) in ["Émile anrufen", "Straße fegen", "ÖL wechseln"].into_iter().enumerate() {
            sqlite.create(NewTask::new(title), at(i as i64)).unwrap();
            memory.create(NewTask::new(title), at(i as i64)).unwrap();
        }

        for query in ["émile", "ÉMILE", "straße", "öl", "Öl wechseln"] {
            let from_sqlite: Vec<TaskId> = sqlite.search(query).unwrap().iter().map(|t| t.id).collect();
            let from_memory: Vec<TaskId> = memory.search(query).unwrap().iter().map(|t| t.id).collect();
            assert_eq!(from_sqlite, from_memory, "query {query:?}");
            assert_eq!(from_sqlite.len(), 1, "query {query:?}");
        }

        let target = TaskReference::from_parts(None, Some("émile"), None);
        assert_eq!(
            reference::resolve(&sqlite, &target, OrdinalPolicy::Position).unwrap(),
            reference::resolve(&memory, &target, OrdinalPolicy::Position).unwrap(),
        );
    }

    #[test]
    fn search_wildcards_are_literal() {
        let (_dir, mut store) = setup();
        store.create(NewTask::new("100% done"), at(0)).unwrap();
        store.create(NewTask::new("plain"), at(1)).unwrap();

        assert_eq!(store.search("%").unwrap().len(), 1);
        assert!(store.search("_").unwrap().is_empty());
    }

    #[test]
    fn update_is_partial() {
        let (_dir, mut store) = setup();
        let task = store
            .create(NewTask::new("Draft").with_category(Category::Work), at(0))
            .unwrap();

        let updated = store
            .update(
                task.id,
                &TaskPatch {
                    title: Some("Final".to_string()),
                    ..TaskPatch::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, task.id);
        assert_eq!(updated.title, "Final");
        assert_eq!(updated.category, Some(Category::Work));
        assert_eq!(updated.created_at, task.created_at);
    }

    #[test]
    fn missing_task_operations() {
        let (_dir, mut store) = setup();
        let missing = TaskId::new(42).unwrap();
        assert!(store.get(missing).unwrap().is_none());
        assert!(store.update(missing, &TaskPatch::default()).unwrap().is_none());
        assert!(!store.delete(missing).unwrap());
    }

    #[test]
    fn corrupt_rows_are_reported() {
        let (_dir, store) = setup();
        store
            .conn
            .execute(
                "INSERT INTO tasks (title, priority, created_at) VALUES ('x', 'urgent', '2025-01-01T00:00:00Z')",
                [],
            )
            .unwrap();

        let err = store.list(None).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { id: 1, .. }));
    }
}
