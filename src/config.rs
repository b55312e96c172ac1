use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::storage::{load_json, save_json, KvStore, PREFERENCES_KEY};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "REMINDUST_DIR";

pub const DEFAULT_REPEAT_COUNT: u32 = 5;
pub const DEFAULT_REMINDER_BEFORE: u32 = 30;
pub const DEFAULT_REMINDER_AFTER: u32 = 30;

/// User preferences applied when a task leaves a setting unspecified.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    /// Number of occurrences created for a repeating task.
    pub repeat_count: u32,
    /// Minutes before the due date to remind.
    pub reminder_before: u32,
    /// Minutes after the due date to remind.
    pub reminder_after: u32,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            repeat_count: DEFAULT_REPEAT_COUNT,
            reminder_before: DEFAULT_REMINDER_BEFORE,
            reminder_after: DEFAULT_REMINDER_AFTER,
        }
    }
}

impl Preferences {
    pub fn load(store: &dyn KvStore) -> Result<Self> {
        let prefs = load_json(store, PREFERENCES_KEY)?.unwrap_or_default();
        debug!(?prefs, "loaded preferences");
        Ok(prefs)
    }

    pub fn save(&self, store: &dyn KvStore) -> Result<()> {
        save_json(store, PREFERENCES_KEY, self)
    }
}

/// Returns the directory holding the application's data files.
///
/// The path is determined in the following order:
/// 1. `REMINDUST_DIR` environment variable.
/// 2. `~/.local/share/remindust` (on Linux).
/// 3. `./remindust` (fallback).
pub fn data_dir() -> PathBuf {
    std::env::var(DATA_DIR_ENV).map(PathBuf::from).unwrap_or_else(|_| {
        let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("remindust");
        p
    })
}
