use chrono::Local;
use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Flex, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, Cell, Clear, Gauge, Padding, Paragraph, Row, Table, Wrap},
};

use crate::app::{App, AppMode};
use crate::theme::Theme;
use crate::timecode::{format_clock, format_timestamp};

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(6),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  let [player_area, list_area] =
    Layout::horizontal([Constraint::Percentage(38), Constraint::Percentage(62)]).areas(main_area);

  render_header(frame, app, header_area);
  render_player(frame, app, player_area);
  render_names(frame, app, list_area);
  render_status(frame, app, status_area);
  render_input(frame, app, input_area);
  render_footer(frame, app, footer_area);

  if app.show_help {
    render_help(frame, theme);
  }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let settings = app.session.settings.get();
  let mut spans =
    vec![Span::styled(" ▶ namecap ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))];
  if let Some(name) = app.player.file_name() {
    spans.push(Span::styled(truncate_str(&name, 40), Style::default().fg(theme.muted)));
  }
  frame.render_widget(Line::from(spans), area);

  let dedupe = if settings.dedupe { "dedupe on" } else { "dedupe off" };
  let right_text = format!("{} · {} ", dedupe, settings.sort_mode.label());
  let width = right_text.chars().count() as u16;
  let right = Line::from(Span::styled(right_text, Style::default().fg(theme.muted)));
  let right_area = Rect { x: area.x + area.width.saturating_sub(width), width: width.min(area.width), ..area };
  frame.render_widget(right, right_area);
}

fn render_player(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let block = Block::bordered()
    .title(Span::styled(" Video ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
    .padding(Padding::horizontal(1));

  if !app.player.is_loaded() {
    let text = vec![
      Line::from(""),
      Line::from(Span::styled("No video loaded", Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
      Line::from(""),
      Line::from(Span::styled("Type /open <path> below", Style::default().fg(theme.muted))),
      Line::from(Span::styled("and press Enter.", Style::default().fg(theme.muted))),
    ];
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center).block(block), area);
    return;
  }

  let inner = block.inner(area);
  frame.render_widget(block, area);

  let [info_area, _, gauge_area] =
    Layout::vertical([Constraint::Min(3), Constraint::Length(1), Constraint::Length(1)]).areas(inner);

  let status = app.player.status;
  let state = if status.paused { "⏸ Paused" } else { "▶ Playing" };
  let lines = vec![
    Line::from(Span::styled(
      truncate_str(&app.player.file_name().unwrap_or_default(), info_area.width as usize),
      Style::default().fg(theme.fg).add_modifier(Modifier::BOLD),
    )),
    Line::from(""),
    Line::from(vec![
      Span::styled("Position  ", Style::default().fg(theme.muted)),
      Span::styled(format_timestamp(status.position), Style::default().fg(theme.fg)),
    ]),
    Line::from(vec![
      Span::styled("State     ", Style::default().fg(theme.muted)),
      Span::styled(state, Style::default().fg(theme.status)),
    ]),
    Line::from(vec![
      Span::styled("Speed     ", Style::default().fg(theme.muted)),
      Span::styled(format!("{}x", status.speed), Style::default().fg(theme.fg)),
    ]),
  ];
  frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), info_area);

  let ratio = match status.duration {
    Some(d) if d > 0.0 => (status.position / d).clamp(0.0, 1.0),
    _ => 0.0,
  };
  let label = format!("{} / {}", format_clock(status.position), format_clock(status.duration.unwrap_or(0.0)));
  let gauge = Gauge::default()
    .gauge_style(Style::default().fg(theme.accent).bg(theme.stripe_bg))
    .ratio(ratio)
    .label(Span::styled(label, Style::default().fg(theme.fg)));
  frame.render_widget(gauge, gauge_area);
}

fn render_names(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let focused = app.mode == AppMode::List;
  let border_color = if focused { theme.accent } else { theme.border };
  let block = Block::bordered()
    .title(format!(" Extracted Names ({}) ", app.displayed.len()))
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color));

  if app.displayed.is_empty() {
    let text = vec![Line::from(""), Line::from(Span::styled("No names added yet.", Style::default().fg(theme.muted)))];
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center).block(block), area);
    return;
  }

  let header = Row::new(["#", "Name", "Timestamp", "Added At"])
    .style(Style::default().fg(theme.muted).add_modifier(Modifier::BOLD))
    .bottom_margin(0);

  let rows: Vec<Row> = app
    .displayed
    .iter()
    .enumerate()
    .map(|(i, entry)| {
      let duplicate = app.duplicates.is_duplicate(&entry.name);
      let bg = if duplicate {
        theme.duplicate_bg
      } else if i % 2 == 1 {
        theme.stripe_bg
      } else {
        theme.bg
      };
      let mut name_spans = vec![Span::styled(entry.name.clone(), Style::default().fg(theme.fg))];
      if duplicate {
        name_spans.push(Span::styled(" (Duplicate)", Style::default().fg(theme.duplicate_fg)));
      }
      Row::new([
        Cell::from(format!("{}", i + 1)).fg(theme.muted),
        Cell::from(Line::from(name_spans)),
        Cell::from(format_timestamp(entry.timestamp)).fg(theme.fg),
        Cell::from(entry.added_at.with_timezone(&Local).format("%H:%M:%S").to_string()).fg(theme.muted),
      ])
      .bg(bg)
    })
    .collect();

  let table = Table::new(
    rows,
    [Constraint::Length(4), Constraint::Min(12), Constraint::Length(10), Constraint::Length(9)],
  )
  .header(header)
  .block(block)
  .column_spacing(1)
  .row_highlight_style(if focused {
    Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD)
  } else {
    Style::default().add_modifier(Modifier::BOLD)
  })
  .highlight_symbol("▶ ");

  frame.render_stateful_widget(table, area, &mut app.list_state);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(info) = &app.info_message {
    (format!(" ℹ  {}", info), Style::default().fg(theme.info))
  } else if app.player.is_loaded() {
    let status = app.player.status;
    (format!(" ♪ {} @ {}x", format_timestamp(status.position), status.speed), Style::default().fg(theme.status))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let border_color = if app.mode == AppMode::Input { theme.accent } else { theme.border };
  let title = if app.player.is_loaded() { " Add Name (Enter) " } else { " Add Name (load a video first) " };
  let input_block = Block::bordered()
    .title(title)
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&app.input, app.cursor_position);

  if cursor_col < app.input_scroll {
    app.input_scroll = cursor_col;
  } else if cursor_col >= app.input_scroll + inner_w {
    app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = app
    .input
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.input_scroll)
    .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = if app.input.is_empty() && app.mode == AppMode::Input {
    Paragraph::new("Type or paste name here…").style(Style::default().fg(theme.muted))
  } else {
    Paragraph::new(visible).style(Style::default().fg(theme.fg))
  };
  frame.render_widget(paragraph.block(input_block), area);

  if app.mode == AppMode::Input {
    let cursor_x = area.x + 2 + (cursor_col - app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let has_names = !app.displayed.is_empty();
  let keys: Vec<(&str, &str)> = match app.mode {
    AppMode::Input => {
      let mut k = vec![("Enter", "Add"), ("Tab", "List"), ("^p", "Play/Pause"), ("^t", "Theme")];
      if has_names {
        k.push(("↓", "List"));
      }
      k.push(("^c", "Quit"));
      k
    }
    AppMode::List => {
      let pause_label = if app.player.status.paused { "Play" } else { "Pause" };
      vec![
        ("Space", pause_label),
        ("←/→", "Frame"),
        ("h/l", "Seek"),
        ("[/]", "Speed"),
        ("d", "Delete"),
        ("u", "Dedupe"),
        ("s", "Sort"),
        ("c/x", "Export"),
        ("?", "Help"),
        ("q", "Quit"),
      ]
    }
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw(" "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);
}

fn render_help(frame: &mut Frame, theme: &Theme) {
  let heading = |s: &'static str| Line::from(Span::styled(s, Style::default().fg(theme.accent).bold()));
  let item = |s: &'static str| Line::from(Span::styled(s, Style::default().fg(theme.fg)));
  let text = vec![
    heading("1. Load a video"),
    item("  Type /open <path> in the input box, or pass the file on the command line."),
    Line::from(""),
    heading("2. Player controls (list focus, Tab to switch)"),
    item("  Space or Ctrl+P play/pause · ←/→ step one frame · h/l seek ±5s · [ ] speed"),
    Line::from(""),
    heading("3. Extract names"),
    item("  Pause when a name is visible, type it, press Enter to capture it with the"),
    item("  current video timestamp."),
    Line::from(""),
    heading("4. Manage the list"),
    item("  u  deduplicate: show only the first instance of each name"),
    item("  s  sort: entry order, A-Z, Z-A"),
    item("  d  delete the selected entry"),
    Line::from(""),
    heading("5. Export"),
    item("  c  CSV   x  Excel  (written as extracted_names.* in the export directory)"),
    Line::from(""),
    Line::from(Span::styled("Press any key to close", Style::default().fg(theme.muted))),
  ];

  let [area] = Layout::horizontal([Constraint::Max(84)]).flex(Flex::Center).areas(frame.area());
  let [area] = Layout::vertical([Constraint::Length(text.len() as u16 + 2)]).flex(Flex::Center).areas(area);

  let block = Block::bordered()
    .title(" How to Use ")
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.accent))
    .padding(Padding::horizontal(1))
    .style(Style::default().bg(theme.bg));
  frame.render_widget(Clear, area);
  frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }).block(block), area);
}
