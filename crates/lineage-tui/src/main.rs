//! `lineage` — terminal browser for a family ancestry tree.
//!
//! # Usage
//!
//! ```
//! lineage --url https://api.example.org/ --token <BEARER> --person KWQS-BBQ
//! lineage --config ~/.config/lineage/config.toml
//! ```

mod app;
mod ui;

use std::{io, time::Duration};

use anyhow::{Context, Result};
use app::{App, ImageCompletion};
use clap::Parser;
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use lineage_client::{ClientConfig, HttpGateway};
use lineage_core::cache::{CacheConfig, ImageCache};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "lineage", about = "Terminal browser for a family ancestry tree")]
struct Args {
  /// Path to a TOML config file (url, token, person).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Discovery root URL of the genealogy service.
  #[arg(long, env = "LINEAGE_URL")]
  url: Option<String>,

  /// Bearer access token for the service.
  #[arg(long, env = "LINEAGE_TOKEN")]
  token: Option<String>,

  /// Person identifier at the root of the tree.
  #[arg(long, env = "LINEAGE_PERSON")]
  person: Option<String>,

  /// How many generations of ancestors to fetch.
  #[arg(long, default_value_t = 4)]
  generations: u32,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:    String,
  #[serde(default)]
  token:  String,
  #[serde(default)]
  person: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  // Log to stderr, quiet by default so frames stay clean.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::ERROR.into())
        .from_env_lossy(),
    )
    .with_writer(io::stderr)
    .init();

  let args = Args::parse();

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file values.
  let discovery_url = args
    .url
    .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
    .context("no discovery URL given (--url, LINEAGE_URL, or config file)")?;
  let access_token = args
    .token
    .or_else(|| (!file_cfg.token.is_empty()).then(|| file_cfg.token.clone()))
    .context("no access token given (--token, LINEAGE_TOKEN, or config file)")?;
  let person_id = args
    .person
    .or_else(|| (!file_cfg.person.is_empty()).then(|| file_cfg.person.clone()))
    .context("no person id given (--person, LINEAGE_PERSON, or config file)")?;

  let gateway = HttpGateway::new(ClientConfig {
    discovery_url,
    access_token,
  })?;
  let cache = ImageCache::new(CacheConfig::default());
  let (completion_tx, mut completion_rx) = mpsc::unbounded_channel::<ImageCompletion>();
  let mut app = App::new(gateway, cache, completion_tx, person_id, args.generations);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Load initial data.
  let load_result = app.reload().await;

  // Run the event loop; restore terminal even on error.
  let run_result = if load_result.is_ok() {
    run_event_loop(&mut terminal, &mut app, &mut completion_rx).await
  } else {
    load_result
  };

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
  completions: &mut mpsc::UnboundedReceiver<ImageCompletion>,
) -> Result<()> {
  loop {
    // Apply any portrait fetches that finished since the last frame, then
    // kick off fetches for rows that became visible.
    while let Ok(done) = completions.try_recv() {
      app.apply_image_completion(done);
    }
    app.ensure_portraits();

    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(evt) = maybe_event {
      match evt {
        Event::Key(key) => {
          let cont = app.handle_key(key).await?;
          if !cont {
            break;
          }
        }
        Event::Resize(_, _) => {
          // Terminal will redraw on next iteration.
        }
        _ => {}
      }
    }
  }

  Ok(())
}
