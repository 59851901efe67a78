use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::storage::codec::{DEFAULT_MAX_CATEGORY_LENGTH, FILE_EXTENSION};

pub const CONFIG_FILE_NAME: &str = "config.json";

/// Settings read from `config.json` in the application directory. Every field is optional in the
/// file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Longer category names are cut when typed in or read from a file.
    pub max_category_length: usize,
    /// Record file used when `--file` isn't given. Relative paths are resolved against the
    /// application directory.
    pub default_file: Option<PathBuf>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_category_length: DEFAULT_MAX_CATEGORY_LENGTH,
            default_file: None,
        }
    }
}

impl TrackerConfig {
    /// Loads configuration from `<dir>/config.json`, or returns defaults if there is none.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse configuration {path:?}")),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No configuration at {path:?}, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read configuration {path:?}")),
        }
    }

    /// Record file to use when none was given on the command line.
    pub fn record_file(&self, dir: &Path) -> PathBuf {
        match &self.default_file {
            Some(file) => dir.join(file),
            None => dir.join(format!("records.{FILE_EXTENSION}")),
        }
    }
}
