use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    duplicates::normalize_name,
    items::{PlanItem, PlanKind},
    model::Plan,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("plan name already taken")]
    NameTaken,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A stored plan; `days` holds the whole nested document.
#[derive(Debug, Clone, FromRow)]
pub struct PlanRecord {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub days: Value,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl PlanRecord {
    pub fn into_plan<I: PlanItem>(self) -> anyhow::Result<Plan<I>> {
        let days = serde_json::from_value(self.days)
            .with_context(|| format!("decode days of plan {}", self.id))?;
        Ok(Plan {
            id: Some(self.id),
            name: self.name,
            description: self.description,
            is_active: self.is_active,
            days,
            date_created: self.created_at,
        })
    }
}

/// Everything written for one plan, in one go.
#[derive(Debug, Clone)]
pub struct PlanWrite {
    pub name: String,
    pub description: String,
    pub days: Value,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
}

impl PlanWrite {
    pub fn from_plan<I: PlanItem>(plan: &Plan<I>) -> anyhow::Result<Self> {
        Ok(Self {
            name: plan.name.clone(),
            description: plan.description.clone(),
            days: serde_json::to_value(&plan.days).context("encode plan days")?,
            is_active: plan.is_active,
            created_at: plan.date_created,
        })
    }
}

/// Plan persistence. Every write covers the plan row and the active pointer
/// together, so a plan is never half written and at most one plan per kind is
/// active.
#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn list(&self, user_id: Uuid, kind: PlanKind) -> Result<Vec<PlanRecord>, StoreError>;
    async fn names(&self, user_id: Uuid, kind: PlanKind) -> Result<Vec<(Uuid, String)>, StoreError>;
    async fn get(&self, user_id: Uuid, kind: PlanKind, id: Uuid) -> Result<Option<PlanRecord>, StoreError>;
    async fn insert(&self, user_id: Uuid, kind: PlanKind, plan: PlanWrite) -> Result<PlanRecord, StoreError>;
    /// Overwrites content; id and creation date stay.
    async fn update(
        &self,
        user_id: Uuid,
        kind: PlanKind,
        id: Uuid,
        plan: PlanWrite,
    ) -> Result<Option<PlanRecord>, StoreError>;
    async fn delete(&self, user_id: Uuid, kind: PlanKind, id: Uuid) -> Result<bool, StoreError>;
    async fn activate(&self, user_id: Uuid, kind: PlanKind, id: Uuid) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgPlanStore {
    db: PgPool,
}

impl PgPlanStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const SELECT_PLAN: &str = r#"
    SELECT p.id, p.name, p.description, p.days, p.created_at, p.updated_at,
           (a.plan_id IS NOT NULL) AS is_active
      FROM plans p
      LEFT JOIN active_plans a ON a.plan_id = p.id
"#;

fn map_unique(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::NameTaken,
        _ => StoreError::Other(anyhow::Error::new(e).context("write plan")),
    }
}

async fn point_active_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    kind: PlanKind,
    id: Uuid,
    active: bool,
) -> anyhow::Result<()> {
    if active {
        sqlx::query(
            r#"
            INSERT INTO active_plans (user_id, kind, plan_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, kind) DO UPDATE SET plan_id = EXCLUDED.plan_id
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(id)
        .execute(&mut **tx)
        .await
        .context("set active plan")?;
    } else {
        sqlx::query("DELETE FROM active_plans WHERE plan_id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .context("clear active plan")?;
    }
    Ok(())
}

impl PgPlanStore {
    async fn fetch(&self, user_id: Uuid, kind: PlanKind, id: Uuid) -> anyhow::Result<Option<PlanRecord>> {
        let sql = format!("{SELECT_PLAN} WHERE p.id = $1 AND p.user_id = $2 AND p.kind = $3");
        let row = sqlx::query_as::<_, PlanRecord>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(kind.as_str())
            .fetch_optional(&self.db)
            .await
            .context("fetch plan")?;
        Ok(row)
    }
}

#[async_trait]
impl PlanStore for PgPlanStore {
    async fn list(&self, user_id: Uuid, kind: PlanKind) -> Result<Vec<PlanRecord>, StoreError> {
        let sql = format!("{SELECT_PLAN} WHERE p.user_id = $1 AND p.kind = $2 ORDER BY p.created_at DESC");
        let rows = sqlx::query_as::<_, PlanRecord>(&sql)
            .bind(user_id)
            .bind(kind.as_str())
            .fetch_all(&self.db)
            .await
            .context("list plans")?;
        Ok(rows)
    }

    async fn names(&self, user_id: Uuid, kind: PlanKind) -> Result<Vec<(Uuid, String)>, StoreError> {
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, name FROM plans WHERE user_id = $1 AND kind = $2",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .fetch_all(&self.db)
        .await
        .context("list plan names")?;
        Ok(rows)
    }

    async fn get(&self, user_id: Uuid, kind: PlanKind, id: Uuid) -> Result<Option<PlanRecord>, StoreError> {
        Ok(self.fetch(user_id, kind, id).await?)
    }

    async fn insert(&self, user_id: Uuid, kind: PlanKind, plan: PlanWrite) -> Result<PlanRecord, StoreError> {
        let id = Uuid::new_v4();
        let mut tx = self.db.begin().await.context("begin tx")?;
        sqlx::query(
            r#"
            INSERT INTO plans (id, user_id, kind, name, name_key, description, days, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(kind.as_str())
        .bind(&plan.name)
        .bind(normalize_name(&plan.name))
        .bind(&plan.description)
        .bind(&plan.days)
        .bind(plan.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_unique)?;
        if plan.is_active {
            point_active_tx(&mut tx, user_id, kind, id, true).await?;
        }
        tx.commit().await.context("commit tx")?;

        self.fetch(user_id, kind, id)
            .await?
            .ok_or_else(|| StoreError::Other(anyhow::anyhow!("plan {id} vanished after insert")))
    }

    async fn update(
        &self,
        user_id: Uuid,
        kind: PlanKind,
        id: Uuid,
        plan: PlanWrite,
    ) -> Result<Option<PlanRecord>, StoreError> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        let updated = sqlx::query(
            r#"
            UPDATE plans
               SET name = $4, name_key = $5, description = $6, days = $7, updated_at = now()
             WHERE id = $1 AND user_id = $2 AND kind = $3
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(kind.as_str())
        .bind(&plan.name)
        .bind(normalize_name(&plan.name))
        .bind(&plan.description)
        .bind(&plan.days)
        .execute(&mut *tx)
        .await
        .map_err(map_unique)?
        .rows_affected();
        if updated == 0 {
            return Ok(None);
        }
        point_active_tx(&mut tx, user_id, kind, id, plan.is_active).await?;
        tx.commit().await.context("commit tx")?;
        Ok(self.fetch(user_id, kind, id).await?)
    }

    async fn delete(&self, user_id: Uuid, kind: PlanKind, id: Uuid) -> Result<bool, StoreError> {
        let deleted = sqlx::query("DELETE FROM plans WHERE id = $1 AND user_id = $2 AND kind = $3")
            .bind(id)
            .bind(user_id)
            .bind(kind.as_str())
            .execute(&self.db)
            .await
            .context("delete plan")?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn activate(&self, user_id: Uuid, kind: PlanKind, id: Uuid) -> Result<bool, StoreError> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM plans WHERE id = $1 AND user_id = $2 AND kind = $3",
        )
        .bind(id)
        .bind(user_id)
        .bind(kind.as_str())
        .fetch_one(&mut *tx)
        .await
        .context("check plan")?;
        if exists == 0 {
            return Ok(false);
        }
        point_active_tx(&mut tx, user_id, kind, id, true).await?;
        tx.commit().await.context("commit tx")?;
        Ok(true)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::{collections::HashMap, sync::Mutex};

    use super::*;

    struct Row {
        user_id: Uuid,
        kind: PlanKind,
        record: PlanRecord,
    }

    /// Keeps plans in a vector; same contract as the Postgres store.
    #[derive(Default)]
    pub struct MemoryPlanStore {
        rows: Mutex<Vec<Row>>,
        active: Mutex<HashMap<(Uuid, PlanKind), Uuid>>,
    }

    impl MemoryPlanStore {
        fn with_flag(&self, user_id: Uuid, kind: PlanKind, mut record: PlanRecord) -> PlanRecord {
            let active = self.active.lock().unwrap();
            record.is_active = active.get(&(user_id, kind)) == Some(&record.id);
            record
        }

        fn point(&self, user_id: Uuid, kind: PlanKind, id: Uuid, active: bool) {
            let mut map = self.active.lock().unwrap();
            if active {
                map.insert((user_id, kind), id);
            } else if map.get(&(user_id, kind)) == Some(&id) {
                map.remove(&(user_id, kind));
            }
        }

        fn taken(&self, user_id: Uuid, kind: PlanKind, name: &str, except: Option<Uuid>) -> bool {
            let key = normalize_name(name);
            self.rows.lock().unwrap().iter().any(|r| {
                r.user_id == user_id
                    && r.kind == kind
                    && Some(r.record.id) != except
                    && normalize_name(&r.record.name) == key
            })
        }
    }

    #[async_trait]
    impl PlanStore for MemoryPlanStore {
        async fn list(&self, user_id: Uuid, kind: PlanKind) -> Result<Vec<PlanRecord>, StoreError> {
            let records: Vec<_> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.user_id == user_id && r.kind == kind)
                .map(|r| r.record.clone())
                .collect();
            Ok(records
                .into_iter()
                .map(|r| self.with_flag(user_id, kind, r))
                .collect())
        }

        async fn names(&self, user_id: Uuid, kind: PlanKind) -> Result<Vec<(Uuid, String)>, StoreError> {
            Ok(self
                .list(user_id, kind)
                .await?
                .into_iter()
                .map(|r| (r.id, r.name))
                .collect())
        }

        async fn get(&self, user_id: Uuid, kind: PlanKind, id: Uuid) -> Result<Option<PlanRecord>, StoreError> {
            Ok(self
                .list(user_id, kind)
                .await?
                .into_iter()
                .find(|r| r.id == id))
        }

        async fn insert(&self, user_id: Uuid, kind: PlanKind, plan: PlanWrite) -> Result<PlanRecord, StoreError> {
            if self.taken(user_id, kind, &plan.name, None) {
                return Err(StoreError::NameTaken);
            }
            let record = PlanRecord {
                id: Uuid::new_v4(),
                name: plan.name,
                description: plan.description,
                days: plan.days,
                is_active: false,
                created_at: plan.created_at,
                updated_at: OffsetDateTime::now_utc(),
            };
            self.rows.lock().unwrap().push(Row {
                user_id,
                kind,
                record: record.clone(),
            });
            if plan.is_active {
                self.point(user_id, kind, record.id, true);
            }
            Ok(self.with_flag(user_id, kind, record))
        }

        async fn update(
            &self,
            user_id: Uuid,
            kind: PlanKind,
            id: Uuid,
            plan: PlanWrite,
        ) -> Result<Option<PlanRecord>, StoreError> {
            if self.taken(user_id, kind, &plan.name, Some(id)) {
                return Err(StoreError::NameTaken);
            }
            let updated = {
                let mut rows = self.rows.lock().unwrap();
                let Some(row) = rows
                    .iter_mut()
                    .find(|r| r.user_id == user_id && r.kind == kind && r.record.id == id)
                else {
                    return Ok(None);
                };
                row.record.name = plan.name;
                row.record.description = plan.description;
                row.record.days = plan.days;
                row.record.updated_at = OffsetDateTime::now_utc();
                row.record.clone()
            };
            self.point(user_id, kind, id, plan.is_active);
            Ok(Some(self.with_flag(user_id, kind, updated)))
        }

        async fn delete(&self, user_id: Uuid, kind: PlanKind, id: Uuid) -> Result<bool, StoreError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| !(r.user_id == user_id && r.kind == kind && r.record.id == id));
            let removed = rows.len() < before;
            drop(rows);
            if removed {
                self.point(user_id, kind, id, false);
            }
            Ok(removed)
        }

        async fn activate(&self, user_id: Uuid, kind: PlanKind, id: Uuid) -> Result<bool, StoreError> {
            if self.get(user_id, kind, id).await?.is_none() {
                return Ok(false);
            }
            self.point(user_id, kind, id, true);
            Ok(true)
        }
    }
}
