//! SQLite-backed repository for players.

use handicap::PlayerId;
use sqlx::SqlitePool;

use crate::persistence::traits::PlayerRepository;
use crate::persistence::{now_timestamp, PersistenceError, PlayerRecord};

#[derive(sqlx::FromRow)]
struct PlayerRow {
    player_id: i64,
    name: String,
    created_at: i64,
}

impl From<PlayerRow> for PlayerRecord {
    fn from(r: PlayerRow) -> Self {
        Self {
            player_id: PlayerId(r.player_id),
            name: r.name,
            created_at: r.created_at as u64,
        }
    }
}

/// SQLite implementation of [`PlayerRepository`].
pub struct SqlitePlayerRepository {
    pool: SqlitePool,
}

impl SqlitePlayerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl PlayerRepository for SqlitePlayerRepository {
    async fn create_player(&self, name: &str) -> Result<PlayerRecord, PersistenceError> {
        let created_at = now_timestamp();
        let result = sqlx::query("INSERT INTO players (name, created_at) VALUES (?, ?)")
            .bind(name)
            .bind(created_at as i64)
            .execute(&self.pool)
            .await?;

        Ok(PlayerRecord {
            player_id: PlayerId(result.last_insert_rowid()),
            name: name.to_string(),
            created_at,
        })
    }

    async fn load_player(&self, id: PlayerId) -> Result<Option<PlayerRecord>, PersistenceError> {
        let row: Option<PlayerRow> =
            sqlx::query_as("SELECT player_id, name, created_at FROM players WHERE player_id = ?")
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(PlayerRecord::from))
    }

    async fn list_players(&self) -> Result<Vec<PlayerRecord>, PersistenceError> {
        let rows: Vec<PlayerRow> =
            sqlx::query_as("SELECT player_id, name, created_at FROM players ORDER BY player_id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(PlayerRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sqlite::Database;

    async fn test_db() -> (Database, SqlitePlayerRepository) {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SqlitePlayerRepository::new(db.pool().clone());
        (db, repo)
    }

    #[tokio::test]
    async fn test_create_and_load() {
        let (_db, repo) = test_db().await;
        let created = repo.create_player("Ada").await.unwrap();
        let loaded = repo.load_player(created.player_id).await.unwrap().unwrap();
        assert_eq!(loaded, created);
    }

    #[tokio::test]
    async fn test_load_missing() {
        let (_db, repo) = test_db().await;
        assert!(repo.load_player(PlayerId(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_in_id_order() {
        let (_db, repo) = test_db().await;
        let a = repo.create_player("Ada").await.unwrap();
        let b = repo.create_player("Bo").await.unwrap();
        let ids: Vec<PlayerId> = repo
            .list_players()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.player_id)
            .collect();
        assert_eq!(ids, vec![a.player_id, b.player_id]);
    }
}
