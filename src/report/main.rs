//! Progress database inspection tool.
//!
//! Prints every stored progress record as a grid table and offers a few
//! maintenance operations: listing active users, backing the database up
//! and resetting a single user.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use wireshark_course_bot::config::BotSettings;
use wireshark_course_bot::progress::{ProgressRow, ProgressStore, SqliteProgressStore};

/// Progress database report.
#[derive(Parser, Debug)]
#[command(name = "show_progress")]
#[command(about = "Shows and maintains the Wireshark course bot's progress database")]
#[command(version)]
struct Args {
    /// Progress database URL (overrides `DATABASE_URL`).
    #[arg(long)]
    database_url: Option<String>,

    /// Only list users active within this many days.
    #[arg(long)]
    active_days: Option<u32>,

    /// Copy the database to this path (must not exist yet).
    #[arg(long)]
    backup: Option<PathBuf>,

    /// Reset the progress of one user.
    #[arg(long, value_name = "USER_ID")]
    reset: Option<i64>,

    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

const HEADERS: [&str; 6] = [
    "user_id",
    "current_module",
    "current_submodule",
    "current_page",
    "completed_modules",
    "last_active",
];

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let database_url = args
        .database_url
        .unwrap_or_else(|| BotSettings::from_env_with_defaults().database_url);

    let store = SqliteProgressStore::open(&database_url)
        .await
        .with_context(|| format!("Failed to open progress database {database_url}"))?;

    if let Some(path) = args.backup {
        if path.exists() {
            bail!("Backup target {} already exists", path.display());
        }
        store
            .backup_to(&path)
            .await
            .context("Failed to back up progress database")?;
        println!("✓ Backup written to: {}", path.display());
        return Ok(());
    }

    if let Some(user) = args.reset {
        store
            .reset_progress(user)
            .await
            .with_context(|| format!("Failed to reset user {user}"))?;
        println!("✓ Progress of user {user} reset");
        return Ok(());
    }

    if let Some(days) = args.active_days {
        let users = store
            .list_active_users(days)
            .await
            .context("Failed to list active users")?;
        println!("{} user(s) active in the last {days} day(s)", users.len());
        for user in users {
            println!("  {user}");
        }
        return Ok(());
    }

    let rows = store.dump().await.context("Failed to read progress rows")?;
    if rows.is_empty() {
        println!("No progress recorded yet.");
    } else {
        print!("{}", render_grid(&rows));
    }
    Ok(())
}

fn init_logging(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn cells(row: &ProgressRow) -> [String; 6] {
    let opt = |v: Option<i64>| v.map(|n| n.to_string()).unwrap_or_default();
    [
        row.user_id.to_string(),
        opt(row.current_module),
        opt(row.current_submodule),
        opt(row.current_page),
        row.completed_display(),
        row.last_active.clone().unwrap_or_default(),
    ]
}

/// Renders rows as a `+---+` bordered grid.
fn render_grid(rows: &[ProgressRow]) -> String {
    let body: Vec<[String; 6]> = rows.iter().map(cells).collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &body {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let border = {
        let mut line = String::from("+");
        for width in widths {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
        }
        line.push('\n');
        line
    };
    let header_border = border.replace('-', "=");

    let line = |cells: &[String]| {
        let mut out = String::from("|");
        for (cell, width) in cells.iter().zip(widths) {
            let pad = width - cell.chars().count();
            out.push_str(&format!(" {cell}{} |", " ".repeat(pad)));
        }
        out.push('\n');
        out
    };

    let mut out = border.clone();
    out.push_str(&line(HEADERS.map(str::to_owned).as_slice()));
    out.push_str(&header_border);
    for row in &body {
        out.push_str(&line(row.as_slice()));
        out.push_str(&border);
    }
    out
}
