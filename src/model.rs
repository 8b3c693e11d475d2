use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One captured name with the playback position it was seen at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameEntry {
  pub id: Uuid,
  pub name: String,
  /// Seconds into the source video at the moment of capture.
  pub timestamp: f64,
  pub added_at: DateTime<Utc>,
}

/// Display order for the derived name list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
  /// Capture order (`added_at`), not position in the video.
  #[default]
  Chronological,
  AlphabeticalAsc,
  AlphabeticalDesc,
}

impl SortMode {
  pub const ALL: [SortMode; 3] = [SortMode::Chronological, SortMode::AlphabeticalAsc, SortMode::AlphabeticalDesc];

  pub fn label(self) -> &'static str {
    match self {
      SortMode::Chronological => "Entry Order",
      SortMode::AlphabeticalAsc => "Sort A-Z",
      SortMode::AlphabeticalDesc => "Sort Z-A",
    }
  }

  pub fn next(self) -> Self {
    // Safety: position() is bounded by ALL.len() and the modulo keeps the index in range.
    let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
    Self::ALL[(idx + 1) % Self::ALL.len()]
  }
}

/// List display settings. Missing fields in persisted data fall back to defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
  pub dedupe: bool,
  pub sort_mode: SortMode,
}

impl Default for Settings {
  fn default() -> Self {
    Self { dedupe: true, sort_mode: SortMode::Chronological }
  }
}

/// Partial settings update; `None` fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsPatch {
  pub dedupe: Option<bool>,
  pub sort_mode: Option<SortMode>,
}

impl Settings {
  /// Shallow merge of `patch` over `self`.
  pub fn merged(self, patch: SettingsPatch) -> Self {
    Self { dedupe: patch.dedupe.unwrap_or(self.dedupe), sort_mode: patch.sort_mode.unwrap_or(self.sort_mode) }
  }
}
