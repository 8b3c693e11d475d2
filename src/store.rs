//! Best-effort key-value mirror for in-memory state.
//!
//! Values are stored as JSON text. Reads fall back to a caller-supplied default
//! on any failure and writes never report errors to the caller: a corrupt or
//! unwritable store must never take the application down. Failures are logged.

use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;
use tracing::{debug, warn};

/// Raw string storage keyed by name.
pub trait Store: Send + Sync {
  /// Returns `Ok(None)` when the key has never been written.
  fn read(&self, key: &str) -> Result<Option<String>>;
  fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// Read and deserialize `key`, or return `default` if it is missing or unreadable.
pub fn load<T: DeserializeOwned>(store: &dyn Store, key: &str, default: T) -> T {
  let raw = match store.read(key) {
    Ok(Some(raw)) => raw,
    Ok(None) => {
      debug!(key, "store: key missing, using default");
      return default;
    }
    Err(e) => {
      warn!(key, err = %format!("{:#}", e), "store: read failed, using default");
      return default;
    }
  };
  match serde_json::from_str(&raw) {
    Ok(value) => value,
    Err(e) => {
      warn!(key, err = %e, "store: stored value is corrupt, using default");
      default
    }
  }
}

/// Serialize and write `value` under `key`. Failures are logged and swallowed.
pub fn save<T: Serialize + ?Sized>(store: &dyn Store, key: &str, value: &T) {
  let raw = match serde_json::to_string(value) {
    Ok(raw) => raw,
    Err(e) => {
      warn!(key, err = %e, "store: failed to serialize value");
      return;
    }
  };
  if let Err(e) = store.write(key, &raw) {
    warn!(key, err = %format!("{:#}", e), "store: write failed");
  }
}

/// One `<key>.json` file per key inside a directory.
pub struct FileStore {
  dir: PathBuf,
}

impl FileStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  fn path_for(&self, key: &str) -> PathBuf {
    self.dir.join(format!("{}.json", key))
  }
}

impl Store for FileStore {
  fn read(&self, key: &str) -> Result<Option<String>> {
    let path = self.path_for(key);
    match std::fs::read_to_string(&path) {
      Ok(content) => Ok(Some(content)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
  }

  fn write(&self, key: &str, value: &str) -> Result<()> {
    std::fs::create_dir_all(&self.dir)
      .with_context(|| format!("Failed to create store directory {}", self.dir.display()))?;
    // Write to a temp file, then rename (atomic)
    let path = self.path_for(key);
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, value).with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, &path).with_context(|| format!("Failed to finalize {}", path.display()))?;
    Ok(())
  }
}

/// Process-local store, for `--ephemeral` sessions and tests.
#[derive(Default)]
pub struct MemoryStore {
  values: StdMutex<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl Store for MemoryStore {
  fn read(&self, key: &str) -> Result<Option<String>> {
    let values = self.values.lock().map_err(|_| anyhow::anyhow!("memory store mutex poisoned"))?;
    Ok(values.get(key).cloned())
  }

  fn write(&self, key: &str, value: &str) -> Result<()> {
    let mut values = self.values.lock().map_err(|_| anyhow::anyhow!("memory store mutex poisoned"))?;
    values.insert(key.to_string(), value.to_string());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{Settings, SortMode};

  /// Store whose every operation fails, to check errors are swallowed.
  struct BrokenStore;

  impl Store for BrokenStore {
    fn read(&self, _key: &str) -> Result<Option<String>> {
      Err(anyhow::anyhow!("disk on fire"))
    }
    fn write(&self, _key: &str, _value: &str) -> Result<()> {
      Err(anyhow::anyhow!("quota exceeded"))
    }
  }

  // --- load ---

  #[test]
  fn load_missing_key_returns_default() {
    let store = MemoryStore::new();
    let value: Vec<String> = load(&store, "nothing", vec!["fallback".to_string()]);
    assert_eq!(value, vec!["fallback".to_string()]);
  }

  #[test]
  fn load_malformed_settings_returns_default() {
    let store = MemoryStore::new();
    store.write("settings", "{not json at all").unwrap();
    let settings: Settings = load(&store, "settings", Settings::default());
    assert_eq!(settings, Settings { dedupe: true, sort_mode: SortMode::Chronological });
  }

  #[test]
  fn load_wrong_shape_returns_default() {
    let store = MemoryStore::new();
    store.write("settings", r#"{"sortMode":"shuffle"}"#).unwrap();
    let settings: Settings = load(&store, "settings", Settings::default());
    assert_eq!(settings, Settings::default());
  }

  #[test]
  fn load_read_error_returns_default() {
    let value: u32 = load(&BrokenStore, "anything", 7);
    assert_eq!(value, 7);
  }

  // --- save ---

  #[test]
  fn save_then_load_returns_value() {
    let store = MemoryStore::new();
    let settings = Settings { dedupe: false, sort_mode: SortMode::AlphabeticalDesc };
    save(&store, "settings", &settings);
    assert_eq!(load(&store, "settings", Settings::default()), settings);
  }

  #[test]
  fn save_write_error_is_swallowed() {
    save(&BrokenStore, "settings", &Settings::default());
  }

  #[test]
  fn last_write_wins() {
    let store = MemoryStore::new();
    save(&store, "n", &1u32);
    save(&store, "n", &2u32);
    assert_eq!(load(&store, "n", 0u32), 2);
  }

  // --- FileStore ---

  #[test]
  fn file_store_creates_directory_and_round_trips() {
    let tmp = tempfile::tempdir().unwrap();
    let store = FileStore::new(tmp.path().join("nested").join("data"));
    save(&store, "settings", &Settings { dedupe: false, sort_mode: SortMode::AlphabeticalAsc });
    assert!(store.dir().join("settings.json").is_file());
    assert!(!store.dir().join("settings.json.tmp").exists());
    let loaded: Settings = load(&store, "settings", Settings::default());
    assert_eq!(loaded.sort_mode, SortMode::AlphabeticalAsc);
    assert!(!loaded.dedupe);
  }

  #[test]
  fn file_store_missing_file_reads_none() {
    let tmp = tempfile::tempdir().unwrap();
    let store = FileStore::new(tmp.path());
    assert!(store.read("nameEntries").unwrap().is_none());
  }

  #[test]
  fn file_store_corrupt_file_falls_back() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("nameEntries.json"), "[{\"id\":").unwrap();
    let store = FileStore::new(tmp.path());
    let entries: Vec<crate::model::NameEntry> = load(&store, "nameEntries", Vec::new());
    assert!(entries.is_empty());
  }
}
