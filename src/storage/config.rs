//! Configuration handling for voice-todo
//!
//! Configuration is stored in `.todo/config.toml` (project) and
//! `config.toml` in the platform config directory (global), e.g.
//! `~/.config/voice-todo/config.toml` on Linux.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::store::DEFAULT_SEARCH_LIMIT;
use super::TODO_DIR;
use crate::domain::OrdinalPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectConfig {
    /// How "task number N" is interpreted
    pub ordinal_policy: OrdinalPolicy,

    /// Maximum number of search results
    pub search_limit: usize,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            ordinal_policy: OrdinalPolicy::Position,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl ProjectConfig {
    fn validate(self) -> Result<Self, ConfigError> {
        if self.search_limit == 0 {
            return Err(ConfigError::Invalid(
                "search_limit must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format when `--format` is not given
    pub default_format: OutputFormat,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Configuration of an open project
///
/// The global config only affects CLI presentation and is loaded on its
/// own through [`Config::load_global`].
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let project = Self::load_project_config(project_root)?;

        Ok(Self {
            project,
            project_root: Some(project_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "voice-todo", "voice-todo")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration, falling back to defaults when absent
    pub fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(TODO_DIR).join("config.toml");

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        Self::parse_project_config(&content)
            .with_context(|| format!("Failed to load project config: {}", config_path.display()))
    }

    fn parse_project_config(content: &str) -> Result<ProjectConfig, ConfigError> {
        toml::from_str::<ProjectConfig>(content)
            .map_err(|e| ConfigError::Parse(e.to_string()))?
            .validate()
    }

    /// Finds the project root by looking for a `.todo/` directory in the
    /// current directory or any parent
    pub fn find_project_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::find_project_root_from(&current)
    }

    /// Like [`find_project_root`](Self::find_project_root), starting at `start`
    pub fn find_project_root_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(TODO_DIR).is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }
}
