use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use study_buddy_core::{Config, ConversationController, ReplyField};
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;

use app::App;

#[derive(Parser)]
#[command(name = "study-buddy")]
#[command(about = "Chat with the Study Buddy assistant from your terminal")]
#[command(version)]
struct Cli {
    /// Base URL of the chat service (overrides config and STUDY_BUDDY_URL)
    #[arg(short, long)]
    backend_url: Option<String>,

    /// Response key to read the reply from first: reply or response
    #[arg(long)]
    reply_field: Option<ReplyField>,

    /// Where to write logs (default: <cache dir>/study-buddy/study-buddy.log)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_file)?;

    // Flag beats environment beats config file
    let config = Config::load()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not load config, using defaults");
            Config::new()
        })
        .with_env()
        .with_backend_url_override(cli.backend_url)
        .with_reply_field_override(cli.reply_field);
    tracing::info!(backend = %config.backend_url(), "starting study buddy");

    let mut app = App::new(ConversationController::from_config(&config));

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = tui::EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await,
            None => break,
        }
    }
    Ok(())
}

/// Logs go to a file; the terminal belongs to the UI
fn init_logging(log_file: Option<PathBuf>) -> Result<()> {
    let path = match log_file {
        Some(path) => path,
        None => dirs::cache_dir()
            .ok_or_else(|| anyhow!("Could not determine cache directory"))?
            .join("study-buddy")
            .join("study-buddy.log"),
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {:?}", path))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("study_buddy=info,study_buddy_core=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reply_field_flag() {
        let cli = Cli::try_parse_from(["study-buddy", "--reply-field", "response"]).unwrap();
        assert_eq!(cli.reply_field, Some(ReplyField::Response));

        let cli = Cli::try_parse_from(["study-buddy"]).unwrap();
        assert_eq!(cli.reply_field, None);

        assert!(Cli::try_parse_from(["study-buddy", "--reply-field", "answer"]).is_err());
    }
}
