use crate::database::models::{Deal, Stage};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

pub struct DealRepository {
    pool: PgPool,
}

impl DealRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Stages

    pub async fn create_stage(
        &self,
        tenant_id: Uuid,
        name: &str,
        position: i32,
    ) -> Result<Stage, sqlx::Error> {
        sqlx::query_as::<_, Stage>(
            r#"INSERT INTO stages (id, tenant_id, name, position)
               VALUES ($1, $2, $3, $4)
               RETURNING id, tenant_id, name, position"#,
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(name)
        .bind(position)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list_stages(&self, tenant_id: Uuid) -> Result<Vec<Stage>, sqlx::Error> {
        sqlx::query_as::<_, Stage>(
            r#"SELECT id, tenant_id, name, position
               FROM stages WHERE tenant_id = $1
               ORDER BY position"#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_stage(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Stage>, sqlx::Error> {
        sqlx::query_as::<_, Stage>(
            r#"SELECT id, tenant_id, name, position
               FROM stages WHERE tenant_id = $1 AND id = $2"#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    // Deals

    pub async fn create(
        &self,
        tenant_id: Uuid,
        title: &str,
        patient_id: Option<Uuid>,
        stage_id: Uuid,
        value_cents: i64,
    ) -> Result<Deal, sqlx::Error> {
        sqlx::query_as::<_, Deal>(
            r#"INSERT INTO deals (id, tenant_id, title, patient_id, stage_id, value_cents, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, NOW())
               RETURNING id, tenant_id, title, patient_id, stage_id, value_cents, created_at, modified_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(title)
        .bind(patient_id)
        .bind(stage_id)
        .bind(value_cents)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        stage_id: Option<Uuid>,
    ) -> Result<Vec<Deal>, sqlx::Error> {
        sqlx::query_as::<_, Deal>(
            r#"SELECT id, tenant_id, title, patient_id, stage_id, value_cents, created_at, modified_at
               FROM deals
               WHERE tenant_id = $1 AND ($2::uuid IS NULL OR stage_id = $2)
               ORDER BY created_at DESC"#,
        )
        .bind(tenant_id)
        .bind(stage_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Deal>, sqlx::Error> {
        sqlx::query_as::<_, Deal>(
            r#"SELECT id, tenant_id, title, patient_id, stage_id, value_cents, created_at, modified_at
               FROM deals WHERE tenant_id = $1 AND id = $2"#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn set_stage(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        stage_id: Uuid,
    ) -> Result<Deal, sqlx::Error> {
        sqlx::query_as::<_, Deal>(
            r#"UPDATE deals SET stage_id = $3, modified_at = $4
               WHERE tenant_id = $1 AND id = $2
               RETURNING id, tenant_id, title, patient_id, stage_id, value_cents, created_at, modified_at"#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(stage_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
    }
}
