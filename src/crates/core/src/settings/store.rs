//! Local key-value storage
//!
//! Plain string keys and values, no schema versioning. [`FileStore`] keeps the
//! whole map in one JSON file; [`MemoryStore`] backs tests.

use crate::util::errors::LightChatResult;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> LightChatResult<()>;
    fn remove(&self, key: &str) -> LightChatResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> LightChatResult<()> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> LightChatResult<()> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`. A missing file starts empty; an unreadable one
    /// is logged and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring unreadable settings file {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("Failed to read settings file {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        debug!("Settings store opened: path={}, entries={}", path.display(), entries.len());
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// `<config dir>/lightchat/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lightchat").join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> LightChatResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> LightChatResult<()> {
        let Ok(mut entries) = self.entries.lock() else {
            return Ok(());
        };
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> LightChatResult<()> {
        let Ok(mut entries) = self.entries.lock() else {
            return Ok(());
        };
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("settings.json");
        {
            let store = FileStore::open(&path);
            store.set("light_gpt_theme", "dark").expect("write");
        }
        let store = FileStore::open(&path);
        assert_eq!(store.get("light_gpt_theme").as_deref(), Some("dark"));
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn file_store_tolerates_corrupt_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").expect("write");

        let store = FileStore::open(&path);
        assert!(store.get("anything").is_none());
        store.set("k", "v").expect("overwrite");
        assert_eq!(FileStore::open(&path).get("k").as_deref(), Some("v"));
    }

    #[test]
    fn file_store_remove_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        let store = FileStore::open(&path);
        store.set("k", "v").expect("set");
        store.set("other", "x").expect("set");
        store.remove("k").expect("remove");
        store.remove("missing").expect("remove missing");

        let reopened = FileStore::open(&path);
        assert!(reopened.get("k").is_none());
        assert_eq!(reopened.get("other").as_deref(), Some("x"));
    }

    #[test]
    fn memory_store_remove() {
        let store = MemoryStore::new();
        store.set("k", "v").expect("set");
        store.remove("k").expect("remove");
        assert!(store.get("k").is_none());
    }
}
