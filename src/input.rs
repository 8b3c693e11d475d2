use anyhow::Result;
use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, AppMode};
use crate::constants::constants;
use crate::export::ExportFormat;

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

// --- Event Handling ---

pub async fn handle_key_event(app: &mut App, key: event::KeyEvent) -> Result<()> {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return Ok(());
  }

  if app.show_help {
    // Any key closes the help overlay.
    app.show_help = false;
    return Ok(());
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('t') {
    app.next_theme();
    return Ok(());
  }

  // Ctrl+P: play/pause without leaving the input box
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('p') {
    toggle_pause(app).await;
    return Ok(());
  }

  if key.code == KeyCode::Tab {
    app.mode = match app.mode {
      AppMode::Input => AppMode::List,
      AppMode::List => AppMode::Input,
    };
    return Ok(());
  }

  match app.mode {
    AppMode::Input => handle_input_key(app, key).await,
    AppMode::List => handle_list_key(app, key).await,
  }
  Ok(())
}

async fn toggle_pause(app: &mut App) {
  if app.player.is_loaded()
    && let Err(e) = app.player.toggle_pause().await
  {
    app.set_error(format!("Pause error: {:#}", e));
  }
}

async fn handle_input_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter => {
      app.submit_input().await;
    }
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
      app.input.insert(byte_idx, c);
      app.cursor_position += 1;
    }
    KeyCode::Backspace => {
      if app.cursor_position > 0 {
        app.cursor_position -= 1;
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Delete => {
      if app.cursor_position < app.input.chars().count() {
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < app.input.chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.input.chars().count();
    }
    KeyCode::Esc => {
      if !app.input.is_empty() {
        app.input.clear();
        app.cursor_position = 0;
        app.input_scroll = 0;
      } else {
        app.mode = AppMode::List;
      }
    }
    KeyCode::Down => {
      if !app.displayed.is_empty() {
        app.mode = AppMode::List;
      }
    }
    _ => {}
  }
}

async fn handle_list_key(app: &mut App, key: event::KeyEvent) {
  let seek = constants().seek_step_secs;
  let result = match key.code {
    KeyCode::Char(' ') => {
      toggle_pause(app).await;
      Ok(())
    }
    KeyCode::Right | KeyCode::Char('.') => app.player.frame_step(true).await,
    KeyCode::Left | KeyCode::Char(',') => app.player.frame_step(false).await,
    KeyCode::Char('l') => app.player.seek_relative(seek).await,
    KeyCode::Char('h') => app.player.seek_relative(-seek).await,
    KeyCode::Char(']') => app.player.step_speed(true).await,
    KeyCode::Char('[') => app.player.step_speed(false).await,
    KeyCode::Down | KeyCode::Char('j') => {
      app.select_next();
      Ok(())
    }
    KeyCode::Up | KeyCode::Char('k') => {
      app.select_prev();
      Ok(())
    }
    KeyCode::Delete | KeyCode::Char('d') => {
      app.remove_selected();
      Ok(())
    }
    KeyCode::Char('u') => {
      app.toggle_dedupe();
      Ok(())
    }
    KeyCode::Char('s') => {
      app.cycle_sort();
      Ok(())
    }
    KeyCode::Char('c') => {
      app.export(ExportFormat::Csv);
      Ok(())
    }
    KeyCode::Char('x') => {
      app.export(ExportFormat::Xlsx);
      Ok(())
    }
    KeyCode::Char('?') => {
      app.show_help = true;
      Ok(())
    }
    KeyCode::Char('i') | KeyCode::Enter => {
      app.mode = AppMode::Input;
      Ok(())
    }
    KeyCode::Char('q') => {
      app.should_quit = true;
      Ok(())
    }
    KeyCode::Esc => {
      app.mode = AppMode::Input;
      Ok(())
    }
    _ => Ok(()),
  };
  if let Err(e) = result {
    app.set_error(format!("Playback error: {:#}", e));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Config;
  use crate::session::Session;
  use crate::store::MemoryStore;
  use ratatui::crossterm::event::KeyEvent;
  use std::sync::Arc;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
  }

  fn app() -> App {
    let mut session = Session::open(Arc::new(MemoryStore::new()));
    session.add_name("Alice", 1.0);
    session.add_name("bob", 2.0);
    App::new(session, Config::default(), std::env::temp_dir())
  }

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("hello", 0), 0);
    assert_eq!(char_to_byte_index("hello", 3), 3);
    assert_eq!(char_to_byte_index("hello", 5), 5); // past end
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "aé日"; // a=1 byte, é=2 bytes, 日=3 bytes
    assert_eq!(char_to_byte_index(s, 0), 0);
    assert_eq!(char_to_byte_index(s, 1), 1);
    assert_eq!(char_to_byte_index(s, 2), 3);
    assert_eq!(char_to_byte_index(s, 3), 6); // past end
  }

  #[test]
  fn char_to_byte_empty() {
    assert_eq!(char_to_byte_index("", 0), 0);
    assert_eq!(char_to_byte_index("", 5), 0);
  }

  // --- handle_key_event ---

  #[tokio::test]
  async fn typing_edits_input_at_cursor() {
    let mut app = app();
    for c in "Zoë".chars() {
      handle_key_event(&mut app, key(KeyCode::Char(c))).await.unwrap();
    }
    handle_key_event(&mut app, key(KeyCode::Left)).await.unwrap();
    handle_key_event(&mut app, key(KeyCode::Backspace)).await.unwrap();
    assert_eq!(app.input, "Zë");
    assert_eq!(app.cursor_position, 1);
  }

  #[tokio::test]
  async fn list_keys_are_plain_text_in_input_mode() {
    let mut app = app();
    handle_key_event(&mut app, key(KeyCode::Char('d'))).await.unwrap();
    assert_eq!(app.input, "d");
    assert_eq!(app.session.entries.list().len(), 2);
  }

  #[tokio::test]
  async fn tab_switches_modes() {
    let mut app = app();
    assert_eq!(app.mode, AppMode::Input);
    handle_key_event(&mut app, key(KeyCode::Tab)).await.unwrap();
    assert_eq!(app.mode, AppMode::List);
    handle_key_event(&mut app, key(KeyCode::Tab)).await.unwrap();
    assert_eq!(app.mode, AppMode::Input);
  }

  #[tokio::test]
  async fn list_mode_delete_removes_selected() {
    let mut app = app();
    app.mode = AppMode::List;
    handle_key_event(&mut app, key(KeyCode::Char('j'))).await.unwrap();
    handle_key_event(&mut app, key(KeyCode::Char('d'))).await.unwrap();
    let names: Vec<&str> = app.session.entries.list().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Alice"]);
  }

  #[tokio::test]
  async fn list_mode_settings_keys() {
    let mut app = app();
    app.mode = AppMode::List;
    handle_key_event(&mut app, key(KeyCode::Char('u'))).await.unwrap();
    assert!(!app.session.settings.get().dedupe);
    handle_key_event(&mut app, key(KeyCode::Char('s'))).await.unwrap();
    assert_eq!(app.session.settings.get().sort_mode, crate::model::SortMode::AlphabeticalAsc);
  }

  #[tokio::test]
  async fn playback_keys_without_video_are_harmless() {
    let mut app = app();
    app.mode = AppMode::List;
    for code in [KeyCode::Char(' '), KeyCode::Right, KeyCode::Left, KeyCode::Char(']'), KeyCode::Char('l')] {
      handle_key_event(&mut app, key(code)).await.unwrap();
    }
    assert!(app.last_error.is_none());
  }

  #[tokio::test]
  async fn help_overlay_swallows_next_key() {
    let mut app = app();
    app.mode = AppMode::List;
    handle_key_event(&mut app, key(KeyCode::Char('?'))).await.unwrap();
    assert!(app.show_help);
    handle_key_event(&mut app, key(KeyCode::Char('d'))).await.unwrap();
    assert!(!app.show_help);
    assert_eq!(app.session.entries.list().len(), 2);
  }

  #[tokio::test]
  async fn ctrl_c_quits_from_any_mode() {
    let mut app = app();
    handle_key_event(&mut app, ctrl('c')).await.unwrap();
    assert!(app.should_quit);
  }
}
