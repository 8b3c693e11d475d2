use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

/// Route `tracing` output to a daily rolling file under `<data_dir>/logs`.
///
/// The TUI owns stdout, so nothing is logged to the terminal. Filtering follows
/// `RUST_LOG`, defaulting to `namecap=info`. Keep the returned guard alive for
/// the whole run or buffered lines are lost.
///
/// Logging is best-effort: with `ephemeral` nothing touches the disk and no
/// subscriber is installed, and a log directory that cannot be set up is
/// reported on stderr before running without logs.
pub fn init(data_dir: &Path, ephemeral: bool) -> Option<WorkerGuard> {
  if ephemeral {
    return None;
  }
  match install(data_dir) {
    Ok(guard) => Some(guard),
    Err(e) => {
      eprintln!("namecap: logging disabled: {:#}", e);
      None
    }
  }
}

fn install(data_dir: &Path) -> Result<WorkerGuard> {
  let (writer, guard) = file_writer(data_dir)?;
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("namecap=info"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .try_init()
    .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;
  Ok(guard)
}

fn file_writer(data_dir: &Path) -> Result<(NonBlocking, WorkerGuard)> {
  let log_dir = data_dir.join("logs");
  std::fs::create_dir_all(&log_dir).with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

  let appender = RollingFileAppender::builder()
    .rotation(Rotation::DAILY)
    .filename_prefix("namecap.log")
    .build(&log_dir)
    .with_context(|| format!("Failed to open log file in {}", log_dir.display()))?;
  Ok(tracing_appender::non_blocking(appender))
}
