//! SQLite-backed repository implementations.
//!
//! ## Database setup
//!
//! [`Database`] wraps a `sqlx::SqlitePool` configured with:
//! - **WAL mode**: one writer, concurrent readers. A reader sees either the
//!   history before a recompute or after it.
//! - **Foreign keys enabled**: deleting a player or round cascades to its
//!   history.
//! - **Embedded migrations**: `sqlx::migrate!` runs
//!   `migrations/001_initial_schema.sql` when [`Database::open`] is called.
//!
//! ## Repository types
//!
//! Each `Sqlite*Repository` holds a `SqlitePool` and implements the
//! corresponding trait from [`crate::persistence::traits`]:
//!
//! | Type | Trait |
//! |------|-------|
//! | [`SqlitePlayerRepository`] | `PlayerRepository` |
//! | [`SqliteTeeSetRepository`] | `TeeSetRepository` |
//! | [`SqliteRoundRepository`] | `RoundRepository` |
//! | [`SqliteHistoryRepository`] | `HistoryRepository` |
//!
//! Enum columns (round status, snapshot source) are stored as `TEXT` and
//! round-tripped through the helpers in [`helpers`]. Round calculation
//! details are stored as JSON next to the source tag.

mod database;
mod history_repo;
mod player_repo;
mod round_repo;
mod tee_repo;
pub(crate) mod helpers;

pub use database::Database;
pub use history_repo::SqliteHistoryRepository;
pub use player_repo::SqlitePlayerRepository;
pub use round_repo::SqliteRoundRepository;
pub use tee_repo::SqliteTeeSetRepository;

use std::sync::Arc;

use crate::persistence::{Persistence, Repositories};

/// The SQLite storage backend.
pub struct SqliteBackend;

impl Persistence for SqliteBackend {
    type Players = SqlitePlayerRepository;
    type Tees = SqliteTeeSetRepository;
    type Rounds = SqliteRoundRepository;
    type History = SqliteHistoryRepository;
}

impl Database {
    /// Repositories sharing this database's pool.
    pub fn repositories(&self) -> Repositories<SqliteBackend> {
        let pool = self.pool().clone();
        Repositories {
            players: Arc::new(SqlitePlayerRepository::new(pool.clone())),
            tees: Arc::new(SqliteTeeSetRepository::new(pool.clone())),
            rounds: Arc::new(SqliteRoundRepository::new(pool.clone())),
            history: Arc::new(SqliteHistoryRepository::new(pool)),
        }
    }
}
