use anyhow::Context;
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{AnalysisResult, SavedAnalysisResponse};

/// A named analysis a user chose to keep. The computed result is stored whole.
#[derive(Debug, Clone, FromRow)]
pub struct SavedAnalysis {
    pub id: Uuid,
    pub name: String,
    pub result: Json<AnalysisResult>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<SavedAnalysis> for SavedAnalysisResponse {
    fn from(a: SavedAnalysis) -> Self {
        Self {
            id: a.id,
            name: a.name,
            created_at: a.created_at,
            updated_at: a.updated_at,
            result: a.result.0,
        }
    }
}

const COLUMNS: &str = "id, name, result, created_at, updated_at";

impl SavedAnalysis {
    pub async fn insert(
        db: &PgPool,
        user_id: Uuid,
        name: &str,
        result: &AnalysisResult,
    ) -> anyhow::Result<SavedAnalysis> {
        let sql = format!(
            "INSERT INTO analyses (id, user_id, name, analysis_type, result) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
        );
        let analysis_type = serde_json::to_value(result.analysis_type)?;
        let row = sqlx::query_as::<_, SavedAnalysis>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(name)
            .bind(analysis_type.as_str().unwrap_or_default())
            .bind(Json(result))
            .fetch_one(db)
            .await
            .context("insert analysis")?;
        Ok(row)
    }

    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<SavedAnalysis>> {
        let sql = format!("SELECT {COLUMNS} FROM analyses WHERE user_id = $1 ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, SavedAnalysis>(&sql)
            .bind(user_id)
            .fetch_all(db)
            .await
            .context("list analyses")?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<SavedAnalysis>> {
        let sql = format!("SELECT {COLUMNS} FROM analyses WHERE id = $1 AND user_id = $2");
        let row = sqlx::query_as::<_, SavedAnalysis>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(db)
            .await
            .context("find analysis")?;
        Ok(row)
    }

    pub async fn rename(db: &PgPool, user_id: Uuid, id: Uuid, name: &str) -> anyhow::Result<Option<SavedAnalysis>> {
        let sql = format!(
            "UPDATE analyses SET name = $3, updated_at = now() \
             WHERE id = $1 AND user_id = $2 RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, SavedAnalysis>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(name)
            .fetch_optional(db)
            .await
            .context("rename analysis")?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM analyses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await
            .context("delete analysis")?;
        Ok(res.rows_affected() > 0)
    }
}
