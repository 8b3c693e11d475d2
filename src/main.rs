mod app;
mod commands;
mod config;
mod constants;
mod export;
mod input;
mod logging;
mod model;
mod pipeline;
mod player;
mod repository;
mod session;
mod store;
mod theme;
mod timecode;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use app::App;
use commands::Command;
use config::Config;
use session::Session;
use store::{FileStore, MemoryStore, Store};

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Video file to open on startup
  video: Option<PathBuf>,

  /// Directory holding the persisted name list and settings
  #[arg(long, global = true, value_name = "DIR")]
  data_dir: Option<PathBuf>,

  /// Keep the name list and settings in memory; no data directory or log files are touched
  #[arg(long, global = true)]
  ephemeral: bool,

  #[command(subcommand)]
  command: Option<Command>,
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let data_dir = args.data_dir.clone().unwrap_or_else(config::default_data_dir);

  // Held until exit so the non-blocking writer flushes.
  let _log_guard = logging::init(&data_dir, args.ephemeral);

  let store: Arc<dyn Store> = if args.ephemeral {
    info!("namecap: starting with an in-memory store");
    Arc::new(MemoryStore::new())
  } else {
    let file_store = FileStore::new(&data_dir);
    info!(dir = %file_store.dir().display(), "namecap: starting");
    Arc::new(file_store)
  };

  let mut session = Session::open(store);
  let config = Config::load();
  let export_dir = config.export_dir();

  if let Some(command) = args.command {
    let mut stdout = std::io::stdout().lock();
    return commands::run(command, &mut session, export_dir, &mut Args::command(), &mut stdout);
  }

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut app = App::new(session, config, export_dir);
  let mut terminal = ratatui::init();
  let result = run(&mut terminal, &mut app, args.video).await;
  ratatui::restore();
  app.player.stop().await?;
  result
}

async fn run(terminal: &mut DefaultTerminal, app: &mut App, video: Option<PathBuf>) -> Result<()> {
  if let Some(path) = video {
    app.open_video(&path).await;
  }

  loop {
    app.player.check_status();
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(app, key).await?;
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }
  Ok(())
}
