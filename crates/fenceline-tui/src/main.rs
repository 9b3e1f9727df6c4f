use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fenceline_core::Config;

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

/// Env var holding the log filter, e.g. `FENCELINE_LOG=fenceline_core=debug`
const LOG_ENV: &str = "FENCELINE_LOG";

/// Log to a file under the config dir; the terminal belongs to the UI.
///
/// Returns the log path, or `None` if no log file could be opened (logging is
/// then disabled).
fn init_logging() -> Option<PathBuf> {
    let path = Config::config_dir().ok()?.join("fenceline.log");
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok()?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    Some(path)
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_path = init_logging();
    info!(version = env!("CARGO_PKG_VERSION"), "fenceline starting");

    let config_path = Config::get_config_path().ok();
    let config = match &config_path {
        Some(path) => Config::load_from(path).unwrap_or_else(|e| {
            warn!("ignoring unreadable config at {}: {}", path.display(), e);
            Config::new()
        }),
        None => Config::new(),
    };

    tui::install_panic_hook();
    let mut terminal = tui::init().context("failed to set up terminal")?;

    let mut events = EventHandler::new();
    let mut app = App::new(
        config,
        config_path,
        log_path,
        Arc::new(events.navigator()),
    );

    let result = run(&mut terminal, &mut app, &mut events).await;

    app.shutdown();
    tui::restore()?;
    info!("fenceline stopped");

    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(app, event).await?;
        }
    }
    Ok(())
}
