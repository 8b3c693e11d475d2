//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!`, so there is no runtime file I/O.
//! Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // Persistent store keys
  pub entries_key: String,
  pub settings_key: String,

  // Playback
  pub seek_step_secs: f64,
  pub playback_rates: Vec<f64>,
  pub ipc_timeout_ms: u64,

  // Export
  pub export_file_stem: String,
  pub export_sheet_name: String,

  // UI
  pub error_dismiss_secs: u64,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is a build-time error.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
