//! Project management
//!
//! Handles project initialization and provides access to the task store.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::{Config, SqliteStore, TODO_DIR};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a todo project. Run 'todo init' first.")]
    NotInProject,
}

const DEFAULT_CONFIG: &str = r#"# voice-todo project configuration

# How "task number N" is read: "position" counts the task list
# (newest first), "id" treats the number as a task ID.
ordinal_policy = "position"

# Maximum number of search results
search_limit = 10
"#;

const GITIGNORE: &str = r#"# SQLite write-ahead log files
tasks.db-wal
tasks.db-shm
"#;

/// A todo project: a directory containing `.todo/`
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(TODO_DIR).is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    ///
    /// Existing config and data are left untouched.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let todo_dir = root.join(TODO_DIR);

        fs::create_dir_all(&todo_dir).with_context(|| {
            format!("Failed to create {TODO_DIR} directory: {}", todo_dir.display())
        })?;

        let config_path = todo_dir.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = todo_dir.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(&gitignore_path, GITIGNORE).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        let project = Self::open(root)?;
        // Create the database up front so `init` fails loudly on a bad location
        project.store()?;
        Ok(project)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .todo directory path
    pub fn todo_dir(&self) -> PathBuf {
        self.root.join(TODO_DIR)
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the database path
    pub fn db_path(&self) -> PathBuf {
        self.todo_dir().join("tasks.db")
    }

    /// Opens the task store, configured from the project settings
    pub fn store(&self) -> Result<SqliteStore> {
        Ok(SqliteStore::open(self.db_path())?.with_search_limit(self.config.project.search_limit))
    }
}
