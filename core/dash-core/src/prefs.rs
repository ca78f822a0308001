//! Operator view preferences, persisted across sessions.
//!
//! Preferences are independent of shift and task data and never reconciled
//! with the server. Missing or unreadable files fall back to defaults.

use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub focus: bool,
}

#[derive(Debug, Default)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    current: RefCell<Preferences>,
}

impl PreferenceStore {
    /// Loads from `path`, using defaults when the file is missing or malformed.
    pub fn load(path: PathBuf) -> Self {
        let current = match read_preferences(&path) {
            Ok(prefs) => prefs,
            Err(err) => {
                warn!(error = %err, path = %path.display(), "Failed to load preferences; using defaults");
                Preferences::default()
            }
        };
        Self {
            path: Some(path),
            current: RefCell::new(current),
        }
    }

    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Preferences {
        self.current.borrow().clone()
    }

    pub fn focus(&self) -> bool {
        self.current.borrow().focus
    }

    /// Updates the in-memory flag, then persists it. The in-memory value is
    /// kept even when the write fails.
    pub fn set_focus(&self, focus: bool) -> Result<(), String> {
        self.current.borrow_mut().focus = focus;
        match &self.path {
            Some(path) => write_preferences(path, &self.current.borrow()),
            None => Ok(()),
        }
    }
}

fn read_preferences(path: &Path) -> Result<Preferences, String> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Preferences::default())
        }
        Err(err) => return Err(format!("Failed to read preferences: {}", err)),
    };

    serde_json::from_slice(&data).map_err(|err| format!("Failed to parse preferences: {}", err))
}

fn write_preferences(path: &Path, prefs: &Preferences) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| format!("Failed to create preferences dir: {}", err))?;
    }

    let payload = serde_json::to_vec_pretty(prefs)
        .map_err(|err| format!("Failed to serialize preferences: {}", err))?;
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, payload).map_err(|err| format!("Failed to write preferences: {}", err))?;
    fs::rename(&tmp_path, path).map_err(|err| format!("Failed to commit preferences: {}", err))?;
    Ok(())
}
