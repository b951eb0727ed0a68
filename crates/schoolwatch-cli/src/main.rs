//! schoolwatch - browse the school directory offline.
//!
//! Serves the local copy of the directory while it is fresh, refreshes it
//! from the remote database when it is not, and rate limits remote syncs.

mod app;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use schoolwatch_core::auth::CredentialStore;
use schoolwatch_core::config::Config;
use schoolwatch_core::{FailedFetchPolicy, SyncClass};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;

/// Log file name inside `<cache dir>/logs`, rotated daily
const LOG_FILE_PREFIX: &str = "schoolwatch.log";

#[derive(Parser, Debug)]
#[command(name = "schoolwatch")]
#[command(about = "Offline-first school directory with rate-limited remote sync")]
#[command(version)]
struct Args {
    /// Remote database URL (overrides config and SCHOOLWATCH_DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh the school list (default)
    Refresh {
        /// Skip the cache and go to the remote, cooldown permitting
        #[arg(long)]
        force: bool,
        /// Also refresh emergency contacts
        #[arg(long)]
        all: bool,
    },
    /// Print the cached school list without touching the network
    List {
        /// Only schools whose name contains this text (case-insensitive)
        #[arg(long, short)]
        search: Option<String>,
        /// Print aggregate student and attendance numbers
        #[arg(long)]
        stats: bool,
    },
    /// Refresh and print emergency contacts
    Emergency {
        #[arg(long)]
        force: bool,
    },
    /// Show cache age and cooldown state per sync class
    Status,
    /// Allow an immediate sync again
    ResetCooldown {
        /// schools or emergency (default: both)
        #[arg(long)]
        class: Option<SyncClass>,
    },
    /// Delete all cached records
    ClearCache,
    /// Mark cached records as stale without deleting them
    ExpireCache,
    /// Show or change the saved configuration
    Config {
        /// Remote database URL to save
        #[arg(long)]
        url: Option<String>,
        /// keep_window_open or consume_window
        #[arg(long)]
        failed_fetch_policy: Option<FailedFetchPolicy>,
    },
    /// Manage the database auth token in the OS keychain
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand, Debug)]
enum TokenAction {
    Set { token: String },
    Clear,
}

/// Initialize the tracing subscriber: stderr plus a daily log file.
///
/// Use RUST_LOG to control the level (e.g., RUST_LOG=schoolwatch_core=debug).
/// When the log directory cannot be used, logging goes to stderr only.
fn init_tracing(log_dir: &Path) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(log_dir);
    let (file_layer, guard) = match file_appender {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        Err(e) => {
            eprintln!("Warning: file logging disabled: {}", e);
            (None, None)
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

/// Apply the given changes to the config file (not to environment
/// overrides) and print the result.
fn update_config(url: Option<String>, policy: Option<FailedFetchPolicy>) -> Result<()> {
    let path = Config::config_path()?;
    let mut stored = Config::load_from(&path)?;

    let changed = url.is_some() || policy.is_some();
    if let Some(url) = url {
        let url = url.trim().to_string();
        stored.database_url = if url.is_empty() { None } else { Some(url) };
    }
    if let Some(policy) = policy {
        stored.failed_fetch_policy = policy;
    }
    if changed {
        stored.save_to(&path)?;
        info!(path = %path.display(), "Configuration saved");
    }

    println!("Config file: {}", path.display());
    println!(
        "Database: {}",
        stored.database_url.as_deref().unwrap_or("(not configured)")
    );
    println!("Failed fetch policy: {}", stored.failed_fetch_policy);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let mut config = Config::load()?;
    if let Some(url) = args.database_url {
        config.database_url = Some(url);
    }

    let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
    let _log_guard = init_tracing(&cache_dir.join("logs"));
    info!("schoolwatch starting");

    let command = args.command.unwrap_or(Command::Refresh {
        force: false,
        all: false,
    });

    if let Command::Config {
        url,
        failed_fetch_policy,
    } = command
    {
        return update_config(url, failed_fetch_policy);
    }

    // Token management never needs the stores
    if let Command::Token { action } = command {
        match action {
            TokenAction::Set { token } => {
                CredentialStore::store_token(token.trim())?;
                println!("Token stored in keychain");
            }
            TokenAction::Clear => {
                CredentialStore::delete_token()?;
                println!("Token removed from keychain");
            }
        }
        return Ok(());
    }

    let app = App::new(config)?;

    match command {
        Command::Refresh { force, all: true } => app.refresh_all(force).await,
        Command::Refresh { force, all: false } => app.refresh_schools(force).await,
        Command::List { search, stats } => app.list_schools(search.as_deref(), stats),
        Command::Emergency { force } => app.refresh_emergency(force).await,
        Command::Status => app.status(),
        Command::ResetCooldown { class } => app.reset_cooldown(class),
        Command::ClearCache => app.clear_cache(),
        Command::ExpireCache => app.expire_cache(),
        Command::Config { .. } | Command::Token { .. } => {}
    }

    info!("schoolwatch finished");
    Ok(())
}
