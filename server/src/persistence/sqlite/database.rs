//! The handicap database: a WAL-mode SQLite pool with the schema from
//! `server/migrations/` applied on open.
//!
//! Recompute writes swap a player's round history in one transaction while
//! queries keep reading; WAL lets those readers see the previous history
//! until the swap commits. Foreign keys are enforced so hole scores and
//! history rows never outlive their round or player.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

use crate::persistence::PersistenceError;

/// Pool size for a file database. Enough for the default rebuild workers plus
/// concurrent readers.
const MAX_CONNECTIONS: u32 = 8;

/// Connection pool over the players, tee sets, rounds and handicap history.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the handicap database at `path`, creating the file and its parent
    /// directories on first use, and bring the schema up to date.
    pub async fn open(path: &Path) -> Result<Self, PersistenceError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(PersistenceError::Io)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(sqlx::Error::from)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(sqlx::Error::from)?;

        tracing::debug!(path = %path.display(), "Opened handicap database");
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Empty handicap database in memory. A single connection, since every
    /// connection to `:memory:` would otherwise get its own database.
    #[cfg(test)]
    pub async fn new_in_memory() -> Result<Self, PersistenceError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(sqlx::Error::from)?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(sqlx::Error::from)?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<(), PersistenceError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PersistenceError::Migration(e.to_string()))?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
