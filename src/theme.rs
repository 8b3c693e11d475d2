use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub muted: Color,
  pub accent: Color,
  pub border: Color,
  pub status: Color,
  pub error: Color,
  pub info: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  /// Row tint for names that have duplicates in the full list.
  pub duplicate_bg: Color,
  pub duplicate_fg: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub const THEMES: [Theme; 3] = [
  Theme {
    name: "Night",
    bg: Color::Rgb(17, 24, 39),
    fg: Color::Rgb(209, 213, 219),
    muted: Color::Rgb(107, 114, 128),
    accent: Color::Rgb(34, 211, 238),
    border: Color::Rgb(55, 65, 81),
    status: Color::Rgb(103, 232, 249),
    error: Color::Rgb(248, 113, 113),
    info: Color::Rgb(134, 239, 172),
    highlight_fg: Color::Rgb(17, 24, 39),
    highlight_bg: Color::Rgb(34, 211, 238),
    stripe_bg: Color::Rgb(31, 41, 55),
    duplicate_bg: Color::Rgb(66, 52, 12),
    duplicate_fg: Color::Rgb(234, 179, 8),
    key_fg: Color::Rgb(17, 24, 39),
    key_bg: Color::Rgb(156, 163, 175),
  },
  Theme {
    name: "Paper",
    bg: Color::Rgb(250, 247, 240),
    fg: Color::Rgb(40, 40, 40),
    muted: Color::Rgb(130, 125, 115),
    accent: Color::Rgb(14, 116, 144),
    border: Color::Rgb(200, 195, 185),
    status: Color::Rgb(14, 116, 144),
    error: Color::Rgb(185, 28, 28),
    info: Color::Rgb(21, 128, 61),
    highlight_fg: Color::Rgb(250, 247, 240),
    highlight_bg: Color::Rgb(14, 116, 144),
    stripe_bg: Color::Rgb(240, 236, 226),
    duplicate_bg: Color::Rgb(254, 240, 199),
    duplicate_fg: Color::Rgb(161, 98, 7),
    key_fg: Color::Rgb(250, 247, 240),
    key_bg: Color::Rgb(120, 113, 108),
  },
  Theme {
    name: "Terminal",
    bg: Color::Reset,
    fg: Color::Reset,
    muted: Color::DarkGray,
    accent: Color::Cyan,
    border: Color::DarkGray,
    status: Color::Cyan,
    error: Color::Red,
    info: Color::Green,
    highlight_fg: Color::Black,
    highlight_bg: Color::Cyan,
    stripe_bg: Color::Reset,
    duplicate_bg: Color::Reset,
    duplicate_fg: Color::Yellow,
    key_fg: Color::Black,
    key_bg: Color::Gray,
  },
];
