//! golfcap: handicap index maintenance and queries.
//!
//! Opens the SQLite database (see [`handicap_server::config`] for the
//! environment variables that locate it), then runs one subcommand:
//!
//! - `import <file>`: load players, tee sets, rounds and manual entries from a
//!   JSON fixture and recompute every imported player.
//! - `rebuild`: recompute every player's timeline on a worker pool.
//! - `recompute <player>`: recompute one player, optionally from a date.
//! - `show <player>`: current index and recent differentials.
//! - `project <player> <tee>`: course and playing handicap for a tee set.
//! - `players`: list players.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use handicap_server::config;
use handicap_server::persistence::sqlite::Database;
use handicap_server::persistence::PersistenceError;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "golfcap", about = "Handicap index maintenance and queries")]
struct Cli {
    /// SQLite database file. Defaults to `GOLFCAP_DB_PATH`, then the data
    /// directory.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Import a JSON fixture and recompute the imported players.
    Import {
        file: PathBuf,
    },
    /// Recompute every player's handicap timeline.
    Rebuild {
        /// Worker tasks. Defaults to `GOLFCAP_WORKERS`, then 4.
        #[arg(short, long)]
        workers: Option<usize>,
    },
    /// Recompute one player's handicap timeline.
    Recompute {
        player: i64,
        /// Only replay rounds played on or after this date (YYYY-MM-DD).
        #[arg(long)]
        from: Option<NaiveDate>,
    },
    /// Show a player's current index and recent differentials.
    Show {
        player: i64,
        /// How many differentials to list.
        #[arg(long, default_value_t = 20)]
        last: usize,
    },
    /// Project a player's course and playing handicap for a tee set.
    Project {
        player: i64,
        tee: i64,
    },
    /// List players.
    Players,
}

/// Setup failures reported before or around a subcommand.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to open database at {path}: {source}")]
    Database {
        path: PathBuf,
        #[source]
        source: PersistenceError,
    },

    #[error("failed to create log directory {path}: {source}")]
    LogDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{failed} of {total} players failed to rebuild")]
    RebuildFailed { failed: usize, total: usize },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(config::get_log_dir())?;

    let db_path = cli.db.unwrap_or_else(config::get_db_path);
    tracing::info!(path = %db_path.display(), "Opening database");
    let db = Database::open(&db_path)
        .await
        .map_err(|source| CliError::Database {
            path: db_path.clone(),
            source,
        })?;

    let engine = config::engine_config_from_env();
    tracing::debug!(?engine, "Engine configuration");

    let mut stdout = std::io::stdout().lock();
    commands::run(cli.command, &db, engine, &mut stdout).await
}
