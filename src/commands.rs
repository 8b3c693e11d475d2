use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use clap_complete::Shell;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

use crate::export::{ExportError, ExportFormat};
use crate::model::{SettingsPatch, SortMode};
use crate::pipeline;
use crate::session::Session;
use crate::timecode::format_timestamp;

/// Headless operations on the same store the TUI uses.
#[derive(Subcommand, Debug)]
pub enum Command {
  /// Print the name list as currently displayed (dedupe and sort applied)
  List {
    /// Emit JSON instead of a table
    #[arg(long)]
    json: bool,
  },
  /// Capture a name at an explicit playback position
  Add {
    name: String,
    /// Playback position in seconds
    #[arg(long = "at", value_name = "SECONDS")]
    at: f64,
  },
  /// Remove an entry by id
  Remove { id: Uuid },
  /// Show or change list settings
  Settings {
    #[arg(long)]
    dedupe: Option<bool>,
    #[arg(long, value_enum)]
    sort: Option<SortArg>,
  },
  /// Export the displayed list
  Export {
    #[arg(value_enum)]
    format: FormatArg,
    /// Output directory (defaults to `export_dir` from prefs, then the working directory)
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,
  },
  /// Generate shell completions
  Completions { shell: Shell },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortArg {
  Chronological,
  #[value(name = "a-z")]
  AToZ,
  #[value(name = "z-a")]
  ZToA,
}

impl From<SortArg> for SortMode {
  fn from(arg: SortArg) -> Self {
    match arg {
      SortArg::Chronological => SortMode::Chronological,
      SortArg::AToZ => SortMode::AlphabeticalAsc,
      SortArg::ZToA => SortMode::AlphabeticalDesc,
    }
  }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
  Csv,
  Xlsx,
}

impl From<FormatArg> for ExportFormat {
  fn from(arg: FormatArg) -> Self {
    match arg {
      FormatArg::Csv => ExportFormat::Csv,
      FormatArg::Xlsx => ExportFormat::Xlsx,
    }
  }
}

/// Run a subcommand, writing its report to `out`. `cli` is the full command
/// tree, needed only for completions.
pub fn run(
  command: Command,
  session: &mut Session,
  export_dir: PathBuf,
  cli: &mut clap::Command,
  out: &mut dyn Write,
) -> Result<()> {
  match command {
    Command::List { json } => list(session, json, out),
    Command::Add { name, at } => {
      match session.add_name(&name, at) {
        Some(entry) => {
          let dedupe = session.settings.get().dedupe;
          let duplicate = pipeline::is_duplicate(&entry.name, session.entries.list(), dedupe);
          let marker = if duplicate { " (Duplicate)" } else { "" };
          writeln!(out, "Added '{}' at {}{} ({})", entry.name, format_timestamp(entry.timestamp), marker, entry.id)?
        }
        None => writeln!(out, "Nothing to add: name is empty.")?,
      }
      Ok(())
    }
    Command::Remove { id } => {
      if session.entries.remove(id) {
        writeln!(out, "Removed {}", id)?;
      } else {
        writeln!(out, "Entry {} not found.", id)?;
      }
      Ok(())
    }
    Command::Settings { dedupe, sort } => {
      let settings = session.update_settings(SettingsPatch { dedupe, sort_mode: sort.map(SortMode::from) });
      writeln!(out, "dedupe: {}", if settings.dedupe { "on" } else { "off" })?;
      writeln!(out, "sort:   {}", settings.sort_mode.label())?;
      Ok(())
    }
    Command::Export { format, out: dir } => {
      let format = ExportFormat::from(format);
      let dir = dir.unwrap_or(export_dir);
      match session.export(format, &dir) {
        Ok(path) => {
          info!(path = %path.display(), "export: done");
          writeln!(out, "{} saved to {}", format.label(), path.display())?;
          Ok(())
        }
        Err(ExportError::Empty) => {
          writeln!(out, "{}", ExportError::Empty)?;
          Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("{} export to {} failed", format.label(), dir.display())),
      }
    }
    Command::Completions { shell } => {
      let name = cli.get_name().to_string();
      clap_complete::generate(shell, cli, name, out);
      Ok(())
    }
  }
}

fn list(session: &Session, json: bool, out: &mut dyn Write) -> Result<()> {
  let displayed = session.displayed();
  if json {
    let text = serde_json::to_string_pretty(&displayed).context("Failed to serialize name list")?;
    writeln!(out, "{}", text)?;
    return Ok(());
  }
  if displayed.is_empty() {
    writeln!(out, "No names added yet.")?;
    return Ok(());
  }
  let duplicates = session.duplicates();
  for (i, entry) in displayed.iter().enumerate() {
    let marker = if duplicates.is_duplicate(&entry.name) { " (Duplicate)" } else { "" };
    writeln!(out, "{:>3}  {}  {}{}  {}", i + 1, format_timestamp(entry.timestamp), entry.name, marker, entry.id)?;
  }
  Ok(())
}
