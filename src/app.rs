use ratatui::widgets::TableState;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::Config;
use crate::constants::constants;
use crate::export::{ExportError, ExportFormat};
use crate::model::{NameEntry, SettingsPatch};
use crate::pipeline::DuplicateIndex;
use crate::player::VideoPlayer;
use crate::session::Session;
use crate::theme::THEMES;
use crate::timecode::format_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  /// Typing a name (or an `/open` command) into the input box.
  Input,
  /// Navigating the name list; playback keys are live.
  List,
}

/// Parse `/open <path>` typed into the input box. Surrounding quotes are stripped
/// and a leading `~/` expands to the home directory.
pub fn parse_open_command(input: &str) -> Option<PathBuf> {
  let rest = input.trim().strip_prefix("/open")?;
  if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
    return None;
  }
  let raw = rest.trim();
  let raw = raw
    .strip_prefix('"')
    .and_then(|s| s.strip_suffix('"'))
    .or_else(|| raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
    .unwrap_or(raw);
  if raw.is_empty() {
    return None;
  }
  if let Some(rest) = raw.strip_prefix("~/")
    && let Some(home) = directories::BaseDirs::new()
  {
    return Some(home.home_dir().join(rest));
  }
  Some(PathBuf::from(raw))
}

pub struct App {
  pub input: String,
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub mode: AppMode,
  pub theme_index: usize,
  pub session: Session,
  /// Derived list, recomputed whenever entries or settings change.
  pub displayed: Vec<NameEntry>,
  pub duplicates: DuplicateIndex,
  pub list_state: TableState,
  pub player: VideoPlayer,
  pub last_error: Option<String>,
  pub status_message: Option<String>,
  /// Informational message, shown with an info icon, lower priority than status/error.
  pub info_message: Option<String>,
  pub show_help: bool,
  pub should_quit: bool,
  export_dir: PathBuf,
  config: Config,
  /// When the last error was set, for auto-dismiss.
  error_time: Option<Instant>,
}

impl App {
  pub fn new(session: Session, config: Config, export_dir: PathBuf) -> Self {
    let theme_index =
      if let Some(ref name) = config.theme_name { THEMES.iter().position(|t| t.name == name).unwrap_or(0) } else { 0 };

    let mut app = Self {
      input: String::new(),
      cursor_position: 0,
      input_scroll: 0,
      mode: AppMode::Input,
      theme_index,
      session,
      displayed: Vec::new(),
      duplicates: DuplicateIndex::default(),
      list_state: TableState::default(),
      player: VideoPlayer::new(),
      last_error: None,
      status_message: None,
      info_message: None,
      show_help: false,
      should_quit: false,
      export_dir,
      config,
      error_time: None,
    };
    app.refresh();
    app
  }

  pub fn theme(&self) -> &'static crate::theme::Theme {
    // Safety: theme_index is bounded by modular arithmetic in next_theme()
    // and by position() on initialization.
    &THEMES[self.theme_index]
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.info_message = None;
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  /// Clear the current error message and its expiry timer.
  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_dismiss_secs)
    {
      self.last_error = None;
      self.error_time = None;
    }
  }

  pub fn set_info(&mut self, msg: String) {
    self.clear_error();
    self.info_message = Some(msg);
  }

  fn save_config(&mut self) {
    self.config.theme_name = Some(self.theme().name.to_string());
    self.config.save();
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.save_config();
  }

  /// Recompute the derived list and duplicate flags, keeping the selection in range.
  pub fn refresh(&mut self) {
    self.displayed = self.session.displayed();
    self.duplicates = self.session.duplicates();
    if self.displayed.is_empty() {
      self.list_state.select(None);
    } else {
      let sel = self.list_state.selected().unwrap_or(0);
      self.list_state.select(Some(sel.min(self.displayed.len().saturating_sub(1))));
    }
  }

  pub fn selected_entry(&self) -> Option<&NameEntry> {
    self.list_state.selected().and_then(|i| self.displayed.get(i))
  }

  pub fn select_next(&mut self) {
    let count = self.displayed.len();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| (i + 1) % count);
      self.list_state.select(Some(i));
    }
  }

  pub fn select_prev(&mut self) {
    let count = self.displayed.len();
    if count > 0 {
      let i =
        self.list_state.selected().map_or(0, |i| if i == 0 { count.saturating_sub(1) } else { i.saturating_sub(1) });
      self.list_state.select(Some(i));
    }
  }

  fn clear_input(&mut self) {
    self.input.clear();
    self.cursor_position = 0;
    self.input_scroll = 0;
  }

  /// Handle Enter in the input box: `/open <path>` loads a video, anything
  /// else is captured as a name at the current playback position.
  pub async fn submit_input(&mut self) {
    if let Some(path) = parse_open_command(&self.input) {
      self.clear_input();
      self.open_video(&path).await;
      return;
    }
    if self.input.trim().is_empty() {
      return;
    }
    if !self.player.is_loaded() {
      self.set_info("Load a video first: /open <path>".to_string());
      return;
    }

    let position = self.player.position().await;
    if let Some(entry) = self.session.add_name(&self.input, position) {
      self.set_info(format!("Added '{}' at {}", entry.name, format_timestamp(entry.timestamp)));
      self.clear_input();
      self.refresh();
      // Keep the new entry in view when it lands somewhere in the sorted list.
      if let Some(idx) = self.displayed.iter().position(|e| e.id == entry.id) {
        self.list_state.select(Some(idx));
      }
    }
  }

  pub async fn open_video(&mut self, path: &Path) {
    self.status_message = Some(format!("Opening {}…", path.display()));
    let result = self.player.open(path).await;
    self.status_message = None;
    match result {
      Ok(()) => {
        let name = self.player.file_name().unwrap_or_default();
        self.set_info(format!("Loaded {}", name));
      }
      Err(e) => {
        warn!(err = %format!("{:#}", e), "player: failed to open video");
        self.set_error(format!("Failed to open video: {:#}", e));
      }
    }
  }

  pub fn remove_selected(&mut self) {
    let Some(entry) = self.selected_entry() else { return };
    let (id, name) = (entry.id, entry.name.clone());
    if self.session.entries.remove(id) {
      self.set_info(format!("Removed '{}'", name));
    }
    self.refresh();
  }

  pub fn toggle_dedupe(&mut self) {
    let dedupe = !self.session.settings.get().dedupe;
    self.session.update_settings(SettingsPatch { dedupe: Some(dedupe), sort_mode: None });
    self.refresh();
  }

  pub fn cycle_sort(&mut self) {
    let next = self.session.settings.get().sort_mode.next();
    self.session.update_settings(SettingsPatch { dedupe: None, sort_mode: Some(next) });
    self.refresh();
  }

  pub fn export(&mut self, format: ExportFormat) {
    match self.session.export(format, &self.export_dir) {
      Ok(path) => {
        info!(path = %path.display(), "export: done");
        self.set_info(format!("{} saved to {}", format.label(), path.display()));
      }
      Err(ExportError::Empty) => self.set_error(ExportError::Empty.to_string()),
      Err(e) => self.set_error(format!("{} export failed: {}", format.label(), e)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::SortMode;
  use crate::store::MemoryStore;
  use std::sync::Arc;

  fn app_with(names: &[&str]) -> App {
    let mut session = Session::open(Arc::new(MemoryStore::new()));
    for (i, name) in names.iter().enumerate() {
      session.add_name(name, i as f64);
    }
    App::new(session, Config::default(), std::env::temp_dir())
  }

  fn displayed_names(app: &App) -> Vec<&str> {
    app.displayed.iter().map(|e| e.name.as_str()).collect()
  }

  // --- parse_open_command ---

  #[test]
  fn parse_open_plain_path() {
    assert_eq!(parse_open_command("/open /videos/a.mp4"), Some(PathBuf::from("/videos/a.mp4")));
    assert_eq!(parse_open_command("  /open   clip.mkv  "), Some(PathBuf::from("clip.mkv")));
  }

  #[test]
  fn parse_open_quoted_path() {
    assert_eq!(parse_open_command("/open \"my video.mp4\""), Some(PathBuf::from("my video.mp4")));
    assert_eq!(parse_open_command("/open 'my video.mp4'"), Some(PathBuf::from("my video.mp4")));
  }

  #[test]
  fn parse_open_rejects_other_input() {
    assert_eq!(parse_open_command("Alice"), None);
    assert_eq!(parse_open_command("/open"), None);
    assert_eq!(parse_open_command("/opener file"), None);
    assert_eq!(parse_open_command("/open \"\""), None);
  }

  // --- App ---

  #[test]
  fn new_app_derives_list_and_selects_first() {
    let app = app_with(&["Alice", "bob", "alice"]);
    assert_eq!(displayed_names(&app), vec!["Alice", "bob"]);
    assert_eq!(app.list_state.selected(), Some(0));
    assert!(app.duplicates.is_duplicate("Alice"));
  }

  #[test]
  fn empty_app_has_no_selection() {
    let app = app_with(&[]);
    assert!(app.displayed.is_empty());
    assert_eq!(app.list_state.selected(), None);
  }

  #[test]
  fn toggle_dedupe_and_cycle_sort_refresh_list() {
    let mut app = app_with(&["bob", "Alice", "alice"]);
    app.toggle_dedupe();
    assert!(!app.session.settings.get().dedupe);
    assert_eq!(displayed_names(&app), vec!["bob", "Alice", "alice"]);

    app.cycle_sort();
    assert_eq!(app.session.settings.get().sort_mode, SortMode::AlphabeticalAsc);
    assert_eq!(displayed_names(&app), vec!["Alice", "alice", "bob"]);
  }

  #[test]
  fn remove_selected_clamps_selection() {
    let mut app = app_with(&["a", "b", "c"]);
    app.list_state.select(Some(2));
    app.remove_selected();
    assert_eq!(displayed_names(&app), vec!["a", "b"]);
    assert_eq!(app.list_state.selected(), Some(1));
    assert_eq!(app.session.entries.list().len(), 2);
  }

  #[test]
  fn remove_selected_on_empty_list_is_noop() {
    let mut app = app_with(&[]);
    app.remove_selected();
    assert!(app.info_message.is_none());
  }

  #[test]
  fn select_wraps_around() {
    let mut app = app_with(&["a", "b"]);
    app.select_next();
    assert_eq!(app.list_state.selected(), Some(1));
    app.select_next();
    assert_eq!(app.list_state.selected(), Some(0));
    app.select_prev();
    assert_eq!(app.list_state.selected(), Some(1));
  }

  #[test]
  fn export_empty_sets_notice() {
    let mut app = app_with(&[]);
    app.export(ExportFormat::Csv);
    assert_eq!(app.last_error.as_deref(), Some("No names to export."));
  }

  #[tokio::test]
  async fn submit_without_video_does_not_capture() {
    let mut app = app_with(&[]);
    app.input = "Alice".to_string();
    app.submit_input().await;
    assert!(app.session.entries.list().is_empty());
    assert_eq!(app.input, "Alice");
    assert!(app.info_message.is_some());
  }

  #[tokio::test]
  async fn submit_blank_is_noop() {
    let mut app = app_with(&[]);
    app.input = "   ".to_string();
    app.submit_input().await;
    assert!(app.session.entries.list().is_empty());
    assert!(app.info_message.is_none());
  }

  #[tokio::test]
  async fn submit_open_missing_file_reports_error() {
    let mut app = app_with(&[]);
    app.input = "/open /no/such/video.mp4".to_string();
    app.submit_input().await;
    assert!(app.input.is_empty());
    assert!(app.last_error.as_deref().is_some_and(|e| e.contains("Failed to open video")));
    assert!(!app.player.is_loaded());
  }
}
