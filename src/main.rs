//! Wireshark Course Bot - Main Entry Point
//!
//! A Telegram bot that walks users through a Wireshark curriculum:
//! theory pages, module quizzes and practice tasks.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use wireshark_course_bot::catalog::{Catalog, PageLibrary};
use wireshark_course_bot::commands::RequestHandler;
use wireshark_course_bot::config::{BotSettings, TelegramConfig};
use wireshark_course_bot::progress::SqliteProgressStore;
use wireshark_course_bot::telegram::CourseBot;

/// Telegram bot for Wireshark training.
#[derive(Parser, Debug)]
#[command(name = "course_bot")]
#[command(about = "Serve the Wireshark course over Telegram")]
#[command(version)]
struct Args {
    /// Path to a catalog JSON file (defaults to the built-in catalog).
    #[arg(short, long)]
    catalog: Option<PathBuf>,

    /// Path to a page library JSON file (defaults to the built-in pages).
    #[arg(short, long)]
    pages: Option<PathBuf>,

    /// Progress database URL (overrides `DATABASE_URL`).
    #[arg(long)]
    database_url: Option<String>,

    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    // Load configurations
    let tg_config = TelegramConfig::from_env()
        .context("Failed to load Telegram configuration from environment")?;

    let settings = BotSettings::from_env_with_defaults();

    let catalog_path = args.catalog.or(settings.catalog_path);
    let catalog = match &catalog_path {
        Some(path) => Catalog::load_from_file(path)
            .with_context(|| format!("Failed to load catalog from {}", path.display()))?,
        None => Catalog::builtin().context("Built-in catalog is invalid")?,
    };

    let pages_path = args.pages.or(settings.pages_path);
    let pages = match &pages_path {
        Some(path) => PageLibrary::load_from_file(path)
            .with_context(|| format!("Failed to load pages from {}", path.display()))?,
        None => PageLibrary::builtin().context("Built-in pages are invalid")?,
    };

    info!(
        "Loaded {} modules and {} pages",
        catalog.total_modules(),
        pages.len()
    );

    let missing = pages.missing_pages(&catalog);
    if !missing.is_empty() {
        warn!(
            "{} catalog page(s) have no content and will show a notice: {}",
            missing.len(),
            missing
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    if !settings.images_dir.is_dir() {
        warn!(
            "Images directory {} not found, pages will be sent as text",
            settings.images_dir.display()
        );
    }

    // Open the progress store
    let database_url = args.database_url.unwrap_or(settings.database_url);
    ensure_database_dir(&database_url)?;
    let store = SqliteProgressStore::open(&database_url)
        .await
        .context("Failed to open progress database")?;
    info!("Progress database ready");

    let handler = Arc::new(RequestHandler::new(
        Arc::new(catalog),
        Arc::new(store),
        Arc::new(pages),
        settings.images_dir,
    ));

    let bot = CourseBot::new(&tg_config, handler);
    if let Err(e) = bot.register_commands().await {
        warn!("Failed to register bot commands: {}", e);
    }

    info!("Starting course bot...");
    info!("Bot is running. Use Ctrl+C to stop.");
    bot.run().await;

    info!("Shutting down...");
    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Creates the parent directory of a file-backed `SQLite` URL.
fn ensure_database_dir(database_url: &str) -> Result<()> {
    let Some(path) = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
    else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" || path.starts_with("file:") {
        return Ok(());
    }

    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
    }
    Ok(())
}
