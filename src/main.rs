use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use storylab_core::Config;
use tracing::{info, warn};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "storylab")]
#[command(about = "Terminal workshop for generating and compiling stories")]
struct Cli {
    /// Answer from built-in sample replies instead of the generation service
    #[arg(long)]
    demo: bool,
    /// Base URL of the generation service
    #[arg(short, long)]
    endpoint: Option<String>,
}

const DEFAULT_LOG_FILTER: &str = "storylab=info,storylab_core=info";

fn log_file_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("storylab")
        .join("storylab.log")
}

/// Logs go to a file; the terminal belongs to the UI
fn init_logging() -> Result<()> {
    let log_path = log_file_path();
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory '{}'", parent.display()))?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file '{}'", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(log_file))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let mut config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "could not read config, using defaults");
        Config::new()
    });
    if cli.demo {
        config.demo_mode = true;
    }
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }
    info!(demo = config.demo_mode, endpoint = %config.endpoint, "starting");

    let mut app = App::new(&config);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }

    info!("shutting down");
    Ok(())
}
