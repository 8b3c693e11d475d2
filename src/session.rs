use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::export::{self, ExportError, ExportFormat};
use crate::model::{NameEntry, Settings, SettingsPatch};
use crate::pipeline::{self, DuplicateIndex};
use crate::repository::{EntryRepository, SettingsState};
use crate::store::Store;
use crate::timecode::sanitize_seconds;

/// The name list and its display settings, owned by whichever front end is running.
pub struct Session {
  pub entries: EntryRepository,
  pub settings: SettingsState,
}

impl Session {
  pub fn open(store: Arc<dyn Store>) -> Self {
    Self { entries: EntryRepository::load(Arc::clone(&store)), settings: SettingsState::load(store) }
  }

  /// Entry point for user input: trims the name and ignores it if nothing is left.
  /// Negative or non-finite timestamps are stored as 0.
  pub fn add_name(&mut self, raw: &str, timestamp: f64) -> Option<NameEntry> {
    let name = raw.trim();
    if name.is_empty() {
      debug!("names: ignoring empty input");
      return None;
    }
    let clamped = sanitize_seconds(timestamp);
    if clamped != timestamp {
      warn!(timestamp, "names: clamping invalid timestamp to 0");
    }
    Some(self.entries.append(name, clamped))
  }

  pub fn update_settings(&mut self, patch: SettingsPatch) -> Settings {
    self.settings.update(patch)
  }

  /// The list as displayed and exported.
  pub fn displayed(&self) -> Vec<NameEntry> {
    pipeline::derive(self.entries.list(), &self.settings.get())
  }

  /// Duplicate flags computed over the full list, not the displayed one.
  pub fn duplicates(&self) -> DuplicateIndex {
    DuplicateIndex::build(self.entries.list(), self.settings.get().dedupe)
  }

  pub fn export(&self, format: ExportFormat, dir: &Path) -> Result<PathBuf, ExportError> {
    export::export_entries(&self.displayed(), format, dir)
  }
}
