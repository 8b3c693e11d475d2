use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::{
  io::BufReader as TokioBufReader,
  io::{AsyncBufReadExt, AsyncWriteExt},
  net::UnixStream,
  process::{Child as TokioChild, Command},
  sync::mpsc,
  task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::constants::constants;
use crate::timecode::sanitize_seconds;

/// Snapshot of the mpv transport state, kept current by the IPC monitor task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackStatus {
  pub position: f64,
  pub duration: Option<f64>,
  pub paused: bool,
  pub speed: f64,
}

impl Default for PlaybackStatus {
  fn default() -> Self {
    Self { position: 0.0, duration: None, paused: true, speed: 1.0 }
  }
}

/// Properties observed on the monitor connection, in observe-id order.
const OBSERVED: [&str; 4] = ["time-pos", "duration", "pause", "speed"];

/// Apply one mpv IPC line to `status`. Returns true if anything changed.
///
/// Only `property-change` events are considered; replies and other events are ignored.
pub fn apply_ipc_line(status: &mut PlaybackStatus, line: &str) -> bool {
  let Ok(val) = serde_json::from_str::<Value>(line) else { return false };
  if val.get("event").and_then(Value::as_str) != Some("property-change") {
    return false;
  }
  let data = val.get("data");
  let before = *status;
  match val.get("name").and_then(Value::as_str) {
    Some("time-pos") => {
      if let Some(pos) = data.and_then(Value::as_f64) {
        status.position = sanitize_seconds(pos);
      }
    }
    Some("duration") => status.duration = data.and_then(Value::as_f64).filter(|d| d.is_finite() && *d >= 0.0),
    Some("pause") => {
      if let Some(paused) = data.and_then(Value::as_bool) {
        status.paused = paused;
      }
    }
    Some("speed") => {
      if let Some(speed) = data.and_then(Value::as_f64) {
        status.speed = speed;
      }
    }
    _ => {}
  }
  *status != before
}

/// Next rate on the ladder above (`up`) or below the current one, if any.
pub fn step_rate(rates: &[f64], current: f64, up: bool) -> Option<f64> {
  if up {
    rates.iter().copied().find(|r| *r > current + f64::EPSILON)
  } else {
    rates.iter().copied().rev().find(|r| *r < current - f64::EPSILON)
  }
}

/// Video playback through an external `mpv` window, controlled over its JSON IPC socket.
#[derive(Default)]
pub struct VideoPlayer {
  pub(crate) current_process: Option<TokioChild>,
  pub video_path: Option<PathBuf>,
  pub status: PlaybackStatus,
  monitor_handle: Option<JoinHandle<()>>,
  status_rx: Option<mpsc::Receiver<PlaybackStatus>>,
  ipc_socket_path: Option<String>,
}

impl VideoPlayer {
  pub fn new() -> Self {
    Self::default()
  }

  /// Whether a video is loaded; capturing names requires one.
  pub fn is_loaded(&self) -> bool {
    self.current_process.is_some()
  }

  pub fn file_name(&self) -> Option<String> {
    self.video_path.as_deref().and_then(Path::file_name).map(|n| n.to_string_lossy().into_owned())
  }

  /// Drain status updates from the monitor task and notice if mpv has exited.
  pub fn check_status(&mut self) {
    if let Some(rx) = &mut self.status_rx {
      while let Ok(status) = rx.try_recv() {
        self.status = status;
      }
    }
    if let Some(child) = &mut self.current_process
      && let Ok(Some(exit)) = child.try_wait()
    {
      info!(code = ?exit.code(), "player: mpv exited");
      self.current_process = None;
      self.clear_session();
    }
  }

  pub async fn open(&mut self, path: &Path) -> Result<()> {
    if !path.is_file() {
      return Err(anyhow!("Not a file: {}", path.display()));
    }
    self.stop().await.context("Failed to stop previous video")?;

    let socket_path = std::env::temp_dir().join(format!("namecap-mpv-{}.sock", std::process::id()));
    let socket_path_str = socket_path.to_str().context("Temp dir path is not valid UTF-8")?.to_string();
    // Remove stale socket if it exists from a previous crash.
    let _ = std::fs::remove_file(&socket_path);

    let mut cmd = Command::new("mpv");
    cmd.args(["--pause", "--keep-open=yes", "--force-window=yes", "--osd-level=1", "--hr-seek=yes"]);
    cmd.arg(format!("--input-ipc-server={}", socket_path_str));
    cmd.arg(path);
    cmd.stdin(Stdio::null());
    // mpv's terminal output would draw over the TUI.
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::null());

    let child = cmd.spawn().map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        anyhow!("mpv not found. Install it with: brew install mpv (macOS) or apt install mpv (Linux)")
      } else {
        anyhow!(e).context("Failed to spawn mpv process")
      }
    })?;

    let (tx, rx) = mpsc::channel::<PlaybackStatus>(32);
    let monitor_socket = socket_path_str.clone();
    let monitor_handle = tokio::spawn(async move {
      if let Err(e) = monitor_playback(&monitor_socket, tx).await {
        warn!(err = %format!("{:#}", e), "player: status monitor stopped");
      }
    });

    info!(path = %path.display(), "player: opened video");
    self.current_process = Some(child);
    self.video_path = Some(path.to_path_buf());
    self.status = PlaybackStatus::default();
    self.status_rx = Some(rx);
    self.monitor_handle = Some(monitor_handle);
    self.ipc_socket_path = Some(socket_path_str);
    Ok(())
  }

  pub async fn toggle_pause(&mut self) -> Result<()> {
    self.send_command(json!(["cycle", "pause"])).await
  }

  /// Step one frame forward or back; mpv pauses on frame steps.
  pub async fn frame_step(&mut self, forward: bool) -> Result<()> {
    let cmd = if forward { "frame-step" } else { "frame-back-step" };
    self.send_command(json!([cmd])).await
  }

  pub async fn seek_relative(&mut self, secs: f64) -> Result<()> {
    self.send_command(json!(["seek", secs, "relative+exact"])).await
  }

  /// Move the playback rate one step along the configured ladder.
  pub async fn step_speed(&mut self, up: bool) -> Result<()> {
    if !self.is_loaded() {
      return Ok(());
    }
    let Some(rate) = step_rate(&constants().playback_rates, self.status.speed, up) else {
      return Ok(());
    };
    self.send_command(json!(["set_property", "speed", rate])).await?;
    self.status.speed = rate;
    Ok(())
  }

  /// Current playback position in seconds, read at call time.
  ///
  /// Asks mpv directly; if that fails the last monitored position is used.
  pub async fn position(&self) -> f64 {
    match self.get_property("time-pos").await {
      Ok(Some(Value::Number(n))) => sanitize_seconds(n.as_f64().unwrap_or(0.0)),
      Ok(other) => {
        debug!(?other, "player: time-pos unavailable, using monitored position");
        self.status.position
      }
      Err(e) => {
        warn!(err = %format!("{:#}", e), "player: time-pos query failed, using monitored position");
        self.status.position
      }
    }
  }

  async fn send_command(&self, command: Value) -> Result<()> {
    let Some(ref socket_path) = self.ipc_socket_path else {
      return Ok(());
    };
    let mut stream = UnixStream::connect(socket_path).await.context("Failed to connect to mpv IPC socket")?;
    let mut line = json!({ "command": command }).to_string();
    line.push('\n');
    stream.write_all(line.as_bytes()).await.context("Failed to send command to mpv")?;
    Ok(())
  }

  async fn get_property(&self, name: &str) -> Result<Option<Value>> {
    let Some(ref socket_path) = self.ipc_socket_path else {
      return Ok(None);
    };
    let mut stream = UnixStream::connect(socket_path).await.context("Failed to connect to mpv IPC socket")?;
    let mut cmd = json!({ "command": ["get_property", name], "request_id": 1 }).to_string();
    cmd.push('\n');
    stream.write_all(cmd.as_bytes()).await.context("Failed to send get_property to mpv IPC")?;

    let reader = TokioBufReader::new(stream);
    let mut lines = reader.lines();
    let timeout = Duration::from_millis(constants().ipc_timeout_ms);

    // mpv may emit event lines before our response; read up to 20 lines.
    for _ in 0..20 {
      let line = tokio::time::timeout(timeout, lines.next_line())
        .await
        .context("Timeout waiting for mpv IPC response")?
        .context("Failed to read from mpv IPC socket")?;

      let Some(line) = line else { break };

      if let Ok(val) = serde_json::from_str::<Value>(&line)
        && val.get("request_id").and_then(Value::as_i64) == Some(1)
      {
        if val.get("error").and_then(Value::as_str) == Some("success") {
          return Ok(val.get("data").cloned());
        }
        return Ok(None);
      }
    }
    Ok(None)
  }

  pub async fn stop(&mut self) -> Result<()> {
    if let Some(mut child) = self.current_process.take() {
      child.kill().await.context("Failed to kill mpv process")?;
      let _ = child.wait().await;
    }
    self.clear_session();
    Ok(())
  }

  fn clear_session(&mut self) {
    if let Some(handle) = self.monitor_handle.take() {
      handle.abort();
    }
    self.status_rx = None;
    self.status = PlaybackStatus::default();
    self.video_path = None;
    if let Some(path) = self.ipc_socket_path.take() {
      let _ = std::fs::remove_file(&path);
    }
  }
}

/// Connect to mpv's IPC socket (retrying while mpv starts up), observe the
/// transport properties, and forward every change as a full status snapshot.
async fn monitor_playback(socket_path: &str, tx: mpsc::Sender<PlaybackStatus>) -> Result<()> {
  let mut stream = None;
  for attempt in 0..20 {
    tokio::time::sleep(Duration::from_millis(if attempt == 0 { 100 } else { 250 })).await;
    match UnixStream::connect(socket_path).await {
      Ok(s) => {
        stream = Some(s);
        break;
      }
      Err(e) => debug!(attempt, err = %e, "player: mpv IPC connect failed, retrying"),
    }
  }
  let mut stream = stream.context("mpv IPC socket never came up")?;

  for (i, name) in OBSERVED.iter().enumerate() {
    let mut cmd = json!({ "command": ["observe_property", i + 1, name] }).to_string();
    cmd.push('\n');
    stream.write_all(cmd.as_bytes()).await.context("Failed to send observe_property")?;
  }
  info!("player: observing mpv playback state");

  let mut status = PlaybackStatus::default();
  let mut lines = TokioBufReader::new(stream).lines();
  while let Some(line) = lines.next_line().await.context("Failed to read from mpv IPC socket")? {
    if apply_ipc_line(&mut status, &line) && tx.send(status).await.is_err() {
      break;
    }
  }
  Ok(())
}
