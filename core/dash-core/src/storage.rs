//! Storage paths for dashboard-local data.
//!
//! The dashboard keeps very little on disk: the operator's preferences and,
//! for interactive sessions, rolling log files. All paths hang off one root so
//! tests can point everything at a temp directory.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "nightwatch";

/// Production code uses `StorageConfig::default()`, which resolves the
/// platform data directory (`$XDG_DATA_HOME/nightwatch` or
/// `~/.local/share/nightwatch` on Linux). Tests use `StorageConfig::with_root()`.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_data_dir(),
        }
    }
}

impl StorageConfig {
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to preferences.json (focus mode and other view flags).
    pub fn preferences_file(&self) -> PathBuf {
        self.root.join("preferences.json")
    }

    /// Directory for rolling log files of interactive sessions.
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
        .map(|base| base.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".nightwatch"))
}
