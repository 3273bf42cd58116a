//! # Storage Layer
//!
//! Persistence for voice-todo.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Tasks | SQLite | `.todo/tasks.db` |
//! | Config | TOML | `.todo/config.toml` |
//! | Global config | TOML | platform config dir, `config.toml` |
//!
//! ## Concurrency Safety
//!
//! - [`SqliteStore`] runs in WAL mode; SQLite serializes writers
//! - Task IDs come from `AUTOINCREMENT` and are never reused
//!
//! ## Project Structure
//!
//! ```text
//! .todo/
//! ├── tasks.db              # All tasks
//! ├── config.toml           # Project configuration
//! └── .gitignore            # Ignores SQLite WAL files
//! ```
//!
//! ## Key Types
//!
//! - [`TaskStore`] - The store contract shared by all backends
//! - [`SqliteStore`] - On-disk store used by the CLI
//! - [`MemoryStore`] - In-process store for tests and embedding
//! - [`Project`] - Entry point for accessing a todo project
//! - [`Config`] - Project and global configuration

mod config;
mod memory;
mod project;
mod sqlite;
mod store;

pub use config::{Config, ConfigError, GlobalConfig, OutputFormat, ProjectConfig};
pub use memory::MemoryStore;
pub use project::{Project, ProjectError};
pub use sqlite::SqliteStore;
pub use store::{StoreError, TaskStore, DEFAULT_SEARCH_LIMIT};

/// Name of the per-project data directory
pub const TODO_DIR: &str = ".todo";
