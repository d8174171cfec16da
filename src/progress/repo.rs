use anyhow::Context;
use sqlx::{FromRow, PgPool};
use time::Date;
use uuid::Uuid;

use super::dto::ProgressSample;

/// One stored weight / training-time sample.
#[derive(Debug, Clone, FromRow)]
pub struct ProgressEntry {
    pub id: Uuid,
    pub date: Date,
    pub weight: Option<f64>,
    pub training_time: Option<f64>,
}

impl ProgressEntry {
    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<ProgressEntry>> {
        let rows = sqlx::query_as::<_, ProgressEntry>(
            r#"
            SELECT id, date, weight, training_time
            FROM progress_entries
            WHERE user_id = $1
            ORDER BY date ASC, created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
        .context("list progress entries")?;
        Ok(rows)
    }

    pub async fn insert(db: &PgPool, user_id: Uuid, sample: &ProgressSample) -> anyhow::Result<ProgressEntry> {
        let row = sqlx::query_as::<_, ProgressEntry>(
            r#"
            INSERT INTO progress_entries (id, user_id, date, weight, training_time)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, date, weight, training_time
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(sample.date)
        .bind(sample.weight)
        .bind(sample.training_time)
        .fetch_one(db)
        .await
        .context("insert progress entry")?;
        Ok(row)
    }

    /// `None` when the id does not belong to the user.
    pub async fn update(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
        sample: &ProgressSample,
    ) -> anyhow::Result<Option<ProgressEntry>> {
        let row = sqlx::query_as::<_, ProgressEntry>(
            r#"
            UPDATE progress_entries
               SET date = $3, weight = $4, training_time = $5
             WHERE id = $1 AND user_id = $2
            RETURNING id, date, weight, training_time
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(sample.date)
        .bind(sample.weight)
        .bind(sample.training_time)
        .fetch_optional(db)
        .await
        .context("update progress entry")?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM progress_entries WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await
            .context("delete progress entry")?;
        Ok(res.rows_affected() > 0)
    }
}
