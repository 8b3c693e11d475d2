use chrono::{DateTime, Duration as ChronoDuration, SubsecRound, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::constants::constants;
use crate::model::{NameEntry, Settings, SettingsPatch};
use crate::store::{self, Store};

/// Insertion-ordered list of captured names, mirrored to the store on every mutation.
pub struct EntryRepository {
  entries: Vec<NameEntry>,
  store: Arc<dyn Store>,
}

impl EntryRepository {
  /// Load the persisted sequence, or start empty if it is missing or corrupt.
  pub fn load(store: Arc<dyn Store>) -> Self {
    let entries: Vec<NameEntry> = store::load(store.as_ref(), &constants().entries_key, Vec::new());
    info!(count = entries.len(), "names: loaded entries");
    Self { entries, store }
  }

  /// Append a new entry captured at `timestamp` seconds.
  ///
  /// The caller trims the name and rejects empty input; nothing is validated here.
  pub fn append(&mut self, name: impl Into<String>, timestamp: f64) -> NameEntry {
    let added_at = self.next_added_at(Utc::now());
    let entry = NameEntry { id: Uuid::new_v4(), name: name.into(), timestamp, added_at };
    info!(id = %entry.id, name = %entry.name, timestamp, "names: appended");
    self.entries.push(entry.clone());
    self.persist();
    entry
  }

  /// Remove the entry with `id`. Returns whether anything was removed; an unknown id is a no-op.
  pub fn remove(&mut self, id: Uuid) -> bool {
    let before = self.entries.len();
    self.entries.retain(|e| e.id != id);
    let removed = self.entries.len() != before;
    info!(%id, removed, "names: remove");
    self.persist();
    removed
  }

  /// All entries in insertion order, regardless of display settings.
  pub fn list(&self) -> &[NameEntry] {
    &self.entries
  }

  /// Creation instants are kept strictly increasing so capture order and
  /// chronological order always agree, even if the wall clock stalls or steps back.
  fn next_added_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
    let now = now.trunc_subsecs(3);
    match self.entries.iter().map(|e| e.added_at).max() {
      Some(last) if now <= last => last + ChronoDuration::milliseconds(1),
      _ => now,
    }
  }

  fn persist(&self) {
    store::save(self.store.as_ref(), &constants().entries_key, &self.entries);
  }
}

/// Current list display settings, mirrored to the store on every update.
pub struct SettingsState {
  current: Settings,
  store: Arc<dyn Store>,
}

impl SettingsState {
  pub fn load(store: Arc<dyn Store>) -> Self {
    let current = store::load(store.as_ref(), &constants().settings_key, Settings::default());
    Self { current, store }
  }

  pub fn get(&self) -> Settings {
    self.current
  }

  /// Merge `patch` over the current settings, persist, and return the result.
  pub fn update(&mut self, patch: SettingsPatch) -> Settings {
    self.current = self.current.merged(patch);
    info!(dedupe = self.current.dedupe, sort = self.current.sort_mode.label(), "settings: updated");
    store::save(self.store.as_ref(), &constants().settings_key, &self.current);
    self.current
  }
}
