use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::Task;

/// Key holding the task list.
pub const TASKS_KEY: &str = "@tasks";
/// Key holding the category list.
pub const CATEGORIES_KEY: &str = "@task_categories";
/// Key holding user preferences.
pub const PREFERENCES_KEY: &str = "@preferences";
/// Key holding the pending reminder queue.
pub const NOTIFICATIONS_KEY: &str = "@notifications";

/// A key-value store of JSON blobs.
pub trait KvStore {
    /// Returns the raw JSON stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;
    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`, with any leading `@` stripped.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(FileStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .trim_start_matches('@')
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        let mut f = match OpenOptions::new().read(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut s = String::new();
        f.read_to_string(&mut s)?;
        debug!(key, path = %path.display(), bytes = s.len(), "read key");
        Ok(Some(s))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        f.write_all(value.as_bytes())?;
        debug!(key, path = %path.display(), bytes = value.len(), "wrote key");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Volatile store, used by tests and previews.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Loads a JSON value stored under `key`, or `None` if the key is absent.
pub fn load_json<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(s) if !s.trim().is_empty() => match serde_json::from_str(&s) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                warn!(key, error = %e, "stored value is not valid JSON");
                Err(Error::Json(e))
            }
        },
        _ => Ok(None),
    }
}

/// Serializes `value` and stores it under `key`.
pub fn save_json<T: Serialize + ?Sized>(store: &dyn KvStore, key: &str, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    store.set(key, &s)
}

/// Loads all tasks. Returns an empty list if none are stored yet.
///
/// Records whose completion fields disagree are repaired in memory: an open
/// task drops its stray `completedDate`, and a completed task with no date is
/// stamped with its due date.
pub fn load_tasks(store: &dyn KvStore) -> Result<Vec<Task>> {
    let mut tasks: Vec<Task> = load_json(store, TASKS_KEY)?.unwrap_or_default();
    let repaired = tasks.iter_mut().map(normalize_completion).filter(|&r| r).count();
    if repaired > 0 {
        warn!(repaired, "repaired inconsistent completion state in stored tasks");
    }
    Ok(tasks)
}

fn normalize_completion(task: &mut Task) -> bool {
    match (task.completed, task.completed_date) {
        (false, Some(_)) => task.completed_date = None,
        (true, None) => task.completed_date = Some(task.due_date),
        _ => return false,
    }
    true
}

/// Replaces the stored task list.
pub fn save_tasks(store: &dyn KvStore, tasks: &[Task]) -> Result<()> {
    save_json(store, TASKS_KEY, tasks)
}

/// Resolves a full id or a unique id prefix to an index into `tasks`.
pub fn find_task(tasks: &[Task], id: &str) -> Result<usize> {
    let needle = id.trim().to_lowercase().replace('-', "");
    if needle.is_empty() {
        return Err(Error::TaskNotFound(id.to_string()));
    }
    let mut matches = tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| t.id.simple().to_string().starts_with(&needle));
    match (matches.next(), matches.next()) {
        (Some((i, _)), None) => Ok(i),
        (Some(_), Some(_)) => Err(Error::AmbiguousTaskId(id.to_string())),
        (None, _) => Err(Error::TaskNotFound(id.to_string())),
    }
}

/// Deletes every key this application writes.
pub fn delete_database(store: &dyn KvStore) -> Result<()> {
    for key in [TASKS_KEY, CATEGORIES_KEY, PREFERENCES_KEY, NOTIFICATIONS_KEY] {
        store.remove(key)?;
    }
    Ok(())
}
