//! SQLite-backed repository for the handicap snapshot history.

use chrono::NaiveDate;
use handicap::{HandicapSnapshot, PlayerId};
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::helpers::{decode_source, encode_source};
use crate::persistence::traits::HistoryRepository;
use crate::persistence::PersistenceError;

#[derive(sqlx::FromRow)]
struct HistoryRow {
    player_id: i64,
    effective_date: NaiveDate,
    handicap_index: f64,
    source: String,
    round_id: Option<i64>,
    calculation_details: Option<String>,
}

impl TryFrom<HistoryRow> for HandicapSnapshot {
    type Error = PersistenceError;

    fn try_from(r: HistoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            player_id: PlayerId(r.player_id),
            effective_date: r.effective_date,
            handicap_index: r.handicap_index,
            source: decode_source(&r.source, r.round_id, r.calculation_details.as_deref())?,
        })
    }
}

/// SQLite implementation of [`HistoryRepository`].
pub struct SqliteHistoryRepository {
    pool: SqlitePool,
}

impl SqliteHistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl HistoryRepository for SqliteHistoryRepository {
    async fn load_history(&self, player: PlayerId) -> Result<Vec<HandicapSnapshot>, PersistenceError> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            r#"
            SELECT player_id, effective_date, handicap_index, source, round_id,
                   calculation_details
            FROM handicap_history
            WHERE player_id = ?
            ORDER BY effective_date, source = 'Round', round_id, entry_id
            "#,
        )
        .bind(player.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(HandicapSnapshot::try_from).collect()
    }

    async fn save_manual_entry(&self, snapshot: &HandicapSnapshot) -> Result<(), PersistenceError> {
        let mut tx = self.pool.begin().await?;
        insert_snapshot(&mut tx, snapshot).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn replace_round_history(
        &self,
        player: PlayerId,
        from: Option<NaiveDate>,
        snapshots: &[HandicapSnapshot],
    ) -> Result<(), PersistenceError> {
        let mut tx = self.pool.begin().await?;

        let deleted = match from {
            Some(date) => {
                sqlx::query(
                    r#"
                    DELETE FROM handicap_history
                    WHERE player_id = ? AND source = 'Round' AND effective_date >= ?
                    "#,
                )
                .bind(player.0)
                .bind(date)
                .execute(&mut *tx)
                .await?
            }
            None => {
                sqlx::query("DELETE FROM handicap_history WHERE player_id = ? AND source = 'Round'")
                    .bind(player.0)
                    .execute(&mut *tx)
                    .await?
            }
        };

        for snapshot in snapshots {
            if snapshot.player_id != player {
                return Err(PersistenceError::Corrupt(format!(
                    "snapshot for player {} in history of player {player}",
                    snapshot.player_id
                )));
            }
            insert_snapshot(&mut tx, snapshot).await?;
        }

        tx.commit().await?;
        tracing::debug!(
            player_id = %player,
            deleted = deleted.rows_affected(),
            inserted = snapshots.len(),
            "Replaced round history"
        );
        Ok(())
    }
}

async fn insert_snapshot(
    tx: &mut Transaction<'_, Sqlite>,
    snapshot: &HandicapSnapshot,
) -> Result<(), PersistenceError> {
    let encoded = encode_source(&snapshot.source)?;
    sqlx::query(
        r#"
        INSERT INTO handicap_history
            (player_id, effective_date, handicap_index, source, round_id, calculation_details)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(snapshot.player_id.0)
    .bind(snapshot.effective_date)
    .bind(snapshot.handicap_index)
    .bind(encoded.tag)
    .bind(encoded.round_id)
    .bind(encoded.details)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
