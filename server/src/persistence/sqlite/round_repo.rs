//! SQLite-backed repository for rounds and hole scores.

use chrono::NaiveDate;
use handicap::{HoleScore, PlayerId, RoundId, RoundInput, TeeRating};
use sqlx::SqlitePool;

use super::helpers::{decode_status, encode_status};
use crate::persistence::traits::RoundRepository;
use crate::persistence::{
    now_timestamp, NewRound, PersistenceError, RoundRecord, RoundStatus, TeeSetId,
};

#[derive(sqlx::FromRow)]
struct RoundRow {
    round_id: i64,
    player_id: i64,
    tee_id: i64,
    date_played: NaiveDate,
    status: String,
    created_at: i64,
}

impl RoundRow {
    fn into_record(self, holes: Vec<HoleScore>) -> Result<RoundRecord, PersistenceError> {
        Ok(RoundRecord {
            round_id: RoundId(self.round_id),
            player_id: PlayerId(self.player_id),
            tee_id: TeeSetId(self.tee_id),
            date_played: self.date_played,
            status: decode_status(&self.status)?,
            holes,
            created_at: self.created_at as u64,
        })
    }
}

/// A completed round joined with its tee ratings.
#[derive(sqlx::FromRow)]
struct RatedRoundRow {
    round_id: i64,
    date_played: NaiveDate,
    course_rating: f64,
    slope_rating: f64,
    par: i64,
}

#[derive(sqlx::FromRow)]
struct HoleRow {
    hole_number: i64,
    par: i64,
    strokes: Option<i64>,
}

impl HoleRow {
    fn into_hole(self) -> Result<HoleScore, PersistenceError> {
        let narrow = |v: i64, what: &str| {
            u8::try_from(v).map_err(|_| {
                PersistenceError::Corrupt(format!(
                    "{what} {v} out of range on hole {}",
                    self.hole_number
                ))
            })
        };
        Ok(HoleScore {
            hole_number: narrow(self.hole_number, "hole number")?,
            par: narrow(self.par, "par")?,
            strokes: self.strokes.map(|s| narrow(s, "strokes")).transpose()?,
        })
    }
}

/// SQLite implementation of [`RoundRepository`].
pub struct SqliteRoundRepository {
    pool: SqlitePool,
}

impl SqliteRoundRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl RoundRepository for SqliteRoundRepository {
    async fn insert_round(&self, data: &NewRound) -> Result<RoundRecord, PersistenceError> {
        let created_at = now_timestamp();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO rounds (player_id, tee_id, date_played, status, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(data.player_id.0)
        .bind(data.tee_id.0)
        .bind(data.date_played)
        .bind(encode_status(data.status))
        .bind(created_at as i64)
        .execute(&mut *tx)
        .await?;
        let round_id = result.last_insert_rowid();

        for hole in &data.holes {
            sqlx::query(
                "INSERT INTO hole_scores (round_id, hole_number, par, strokes) VALUES (?, ?, ?, ?)",
            )
            .bind(round_id)
            .bind(hole.hole_number as i64)
            .bind(hole.par as i64)
            .bind(hole.strokes.map(i64::from))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let mut holes = data.holes.clone();
        holes.sort_by_key(|h| h.hole_number);
        Ok(RoundRecord {
            round_id: RoundId(round_id),
            player_id: data.player_id,
            tee_id: data.tee_id,
            date_played: data.date_played,
            status: data.status,
            holes,
            created_at,
        })
    }

    async fn load_round(&self, id: RoundId) -> Result<Option<RoundRecord>, PersistenceError> {
        let row: Option<RoundRow> = sqlx::query_as(
            r#"
            SELECT round_id, player_id, tee_id, date_played, status, created_at
            FROM rounds
            WHERE round_id = ?
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            None => Ok(None),
            Some(r) => {
                let holes = load_holes_for_round(&self.pool, r.round_id).await?;
                Ok(Some(r.into_record(holes)?))
            }
        }
    }

    async fn update_holes(&self, id: RoundId, holes: &[HoleScore]) -> Result<(), PersistenceError> {
        let mut tx = self.pool.begin().await?;
        for hole in holes {
            sqlx::query(
                r#"
                INSERT INTO hole_scores (round_id, hole_number, par, strokes)
                VALUES (?, ?, ?, ?)
                ON CONFLICT (round_id, hole_number)
                DO UPDATE SET par = excluded.par, strokes = excluded.strokes
                "#,
            )
            .bind(id.0)
            .bind(hole.hole_number as i64)
            .bind(hole.par as i64)
            .bind(hole.strokes.map(i64::from))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn set_status(&self, id: RoundId, status: RoundStatus) -> Result<(), PersistenceError> {
        sqlx::query("UPDATE rounds SET status = ? WHERE round_id = ?")
            .bind(encode_status(status))
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn completed_rounds(&self, player: PlayerId) -> Result<Vec<RoundInput>, PersistenceError> {
        let rows: Vec<RatedRoundRow> = sqlx::query_as(
            r#"
            SELECT r.round_id, r.date_played, t.course_rating, t.slope_rating, t.par
            FROM rounds r
            JOIN tee_sets t ON t.tee_id = r.tee_id
            WHERE r.player_id = ? AND r.status = 'Completed'
            ORDER BY r.date_played, r.round_id
            "#,
        )
        .bind(player.0)
        .fetch_all(&self.pool)
        .await?;

        let mut rounds = Vec::with_capacity(rows.len());
        for row in rows {
            let holes = load_holes_for_round(&self.pool, row.round_id)
                .await
                .map_err(|e| match e {
                    PersistenceError::Corrupt(reason) => PersistenceError::CorruptRound {
                        round_id: RoundId(row.round_id),
                        date: row.date_played,
                        reason,
                    },
                    other => other,
                })?;
            rounds.push(RoundInput {
                round_id: RoundId(row.round_id),
                date_played: row.date_played,
                holes,
                tee: TeeRating::new(row.course_rating, row.slope_rating, row.par as i32),
            });
        }
        Ok(rounds)
    }
}

/// Load all hole scores for a round ordered by hole number.
async fn load_holes_for_round(
    pool: &SqlitePool,
    round_id: i64,
) -> Result<Vec<HoleScore>, PersistenceError> {
    let rows: Vec<HoleRow> = sqlx::query_as(
        r#"
        SELECT hole_number, par, strokes
        FROM hole_scores
        WHERE round_id = ?
        ORDER BY hole_number
        "#,
    )
    .bind(round_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(HoleRow::into_hole).collect()
}
