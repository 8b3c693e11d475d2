//! Playback positions: clamping and the two text forms used by the TUI and the CLI.

/// Clamp a position to a non-negative finite number of seconds.
pub fn sanitize_seconds(secs: f64) -> f64 {
  if secs.is_finite() && secs > 0.0 { secs } else { 0.0 }
}

/// Video timestamp as `MM:SS.ss`.
pub fn format_timestamp(secs: f64) -> String {
  let secs = sanitize_seconds(secs);
  let minutes = (secs / 60.0).floor() as u64;
  let seconds = secs - minutes as f64 * 60.0;
  format!("{:02}:{:05.2}", minutes, seconds)
}

/// Coarse clock for the transport bar, `MM:SS`.
pub fn format_clock(secs: f64) -> String {
  let total = sanitize_seconds(secs).floor() as u64;
  format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
  use super::*;

  // --- sanitize_seconds ---

  #[test]
  fn sanitize_seconds_clamps() {
    assert_eq!(sanitize_seconds(12.5), 12.5);
    assert_eq!(sanitize_seconds(-0.01), 0.0);
    assert_eq!(sanitize_seconds(f64::NAN), 0.0);
    assert_eq!(sanitize_seconds(f64::INFINITY), 0.0);
    assert_eq!(sanitize_seconds(f64::NEG_INFINITY), 0.0);
  }

  // --- format_timestamp ---

  #[test]
  fn format_timestamp_pads_minutes_and_seconds() {
    assert_eq!(format_timestamp(0.0), "00:00.00");
    assert_eq!(format_timestamp(5.5), "00:05.50");
    assert_eq!(format_timestamp(65.25), "01:05.25");
    assert_eq!(format_timestamp(3600.0), "60:00.00");
  }

  #[test]
  fn format_timestamp_clamps_invalid() {
    assert_eq!(format_timestamp(-3.0), "00:00.00");
    assert_eq!(format_timestamp(f64::NAN), "00:00.00");
  }

  // --- format_clock ---

  #[test]
  fn format_clock_truncates_fraction() {
    assert_eq!(format_clock(59.9), "00:59");
    assert_eq!(format_clock(61.0), "01:01");
    assert_eq!(format_clock(f64::NAN), "00:00");
  }
}
