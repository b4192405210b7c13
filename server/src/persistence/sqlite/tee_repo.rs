//! SQLite-backed repository for tee sets.

use sqlx::SqlitePool;

use crate::persistence::traits::TeeSetRepository;
use crate::persistence::{NewTeeSet, PersistenceError, TeeSetId, TeeSetRecord};

#[derive(sqlx::FromRow)]
struct TeeRow {
    tee_id: i64,
    course_name: String,
    tee_name: String,
    course_rating: f64,
    slope_rating: f64,
    par: i64,
}

impl From<TeeRow> for TeeSetRecord {
    fn from(r: TeeRow) -> Self {
        Self {
            tee_id: TeeSetId(r.tee_id),
            course_name: r.course_name,
            tee_name: r.tee_name,
            course_rating: r.course_rating,
            slope_rating: r.slope_rating,
            par: r.par as i32,
        }
    }
}

/// SQLite implementation of [`TeeSetRepository`].
pub struct SqliteTeeSetRepository {
    pool: SqlitePool,
}

impl SqliteTeeSetRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl TeeSetRepository for SqliteTeeSetRepository {
    async fn create_tee_set(&self, data: &NewTeeSet) -> Result<TeeSetRecord, PersistenceError> {
        let result = sqlx::query(
            r#"
            INSERT INTO tee_sets (course_name, tee_name, course_rating, slope_rating, par)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&data.course_name)
        .bind(&data.tee_name)
        .bind(data.course_rating)
        .bind(data.slope_rating)
        .bind(data.par as i64)
        .execute(&self.pool)
        .await?;

        Ok(TeeSetRecord {
            tee_id: TeeSetId(result.last_insert_rowid()),
            course_name: data.course_name.clone(),
            tee_name: data.tee_name.clone(),
            course_rating: data.course_rating,
            slope_rating: data.slope_rating,
            par: data.par,
        })
    }

    async fn load_tee_set(&self, id: TeeSetId) -> Result<Option<TeeSetRecord>, PersistenceError> {
        let row: Option<TeeRow> = sqlx::query_as(
            r#"
            SELECT tee_id, course_name, tee_name, course_rating, slope_rating, par
            FROM tee_sets
            WHERE tee_id = ?
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(TeeSetRecord::from))
    }
}
