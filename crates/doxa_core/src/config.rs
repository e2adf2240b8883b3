//! Runtime configuration for hosts embedding the store.
//!
//! # Responsibility
//! - Describe where the database lives and how logging is set up.
//! - Resolve overrides from `DOXA_*` environment variables.
//!
//! # Invariants
//! - Every field has a default, so an empty source yields a usable config.

use crate::db::{DbResult, Store};
use crate::logging::{default_log_level, init_logging};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_DB_FILE_NAME: &str = "doxa.db";

const ENV_DB_PATH: &str = "DOXA_DB_PATH";
const ENV_LOG_LEVEL: &str = "DOXA_LOG_LEVEL";
const ENV_LOG_DIR: &str = "DOXA_LOG_DIR";

/// Store and logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl StoreConfig {
    /// Builds a config from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = non_blank(lookup(ENV_DB_PATH)) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = non_blank(lookup(ENV_LOG_LEVEL)) {
            config.log_level = level;
        }
        config.log_dir = non_blank(lookup(ENV_LOG_DIR)).map(PathBuf::from);
        config
    }

    /// Starts file logging when a log directory is configured.
    pub fn init_logging(&self) -> Result<(), String> {
        let Some(dir) = self.log_dir.as_ref() else {
            return Ok(());
        };
        let dir = dir
            .to_str()
            .ok_or_else(|| format!("log_dir `{}` is not valid UTF-8", dir.display()))?;
        init_logging(&self.log_level, dir)
    }

    /// Opens the configured database, applying pending migrations.
    pub fn open_store(&self) -> DbResult<Store> {
        Store::open(&self.db_path)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}
