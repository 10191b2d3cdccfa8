use crate::database::models::Report;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        title: &str,
        metrics: serde_json::Value,
    ) -> Result<Report, sqlx::Error> {
        sqlx::query_as::<_, Report>(
            r#"INSERT INTO reports (id, tenant_id, title, metrics, created_at)
               VALUES ($1, $2, $3, $4, NOW())
               RETURNING id, tenant_id, title, metrics, public_token, published_at,
                         created_at, modified_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(title)
        .bind(metrics)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list(&self, tenant_id: Uuid) -> Result<Vec<Report>, sqlx::Error> {
        sqlx::query_as::<_, Report>(
            r#"SELECT id, tenant_id, title, metrics, public_token, published_at,
                      created_at, modified_at
               FROM reports WHERE tenant_id = $1
               ORDER BY created_at DESC"#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Report>, sqlx::Error> {
        sqlx::query_as::<_, Report>(
            r#"SELECT id, tenant_id, title, metrics, public_token, published_at,
                      created_at, modified_at
               FROM reports WHERE tenant_id = $1 AND id = $2"#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        title: &str,
        metrics: serde_json::Value,
    ) -> Result<Option<Report>, sqlx::Error> {
        sqlx::query_as::<_, Report>(
            r#"UPDATE reports SET title = $3, metrics = $4, modified_at = $5
               WHERE tenant_id = $1 AND id = $2
               RETURNING id, tenant_id, title, metrics, public_token, published_at,
                         created_at, modified_at"#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(title)
        .bind(metrics)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
    }

    /// Mints the public token on first publish; republishing keeps it stable.
    pub async fn publish(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Report>, sqlx::Error> {
        sqlx::query_as::<_, Report>(
            r#"UPDATE reports
               SET public_token = COALESCE(public_token, $3),
                   published_at = NOW()
               WHERE tenant_id = $1 AND id = $2
               RETURNING id, tenant_id, title, metrics, public_token, published_at,
                         created_at, modified_at"#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(Uuid::new_v4())
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn unpublish(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Report>, sqlx::Error> {
        sqlx::query_as::<_, Report>(
            r#"UPDATE reports SET published_at = NULL
               WHERE tenant_id = $1 AND id = $2
               RETURNING id, tenant_id, title, metrics, public_token, published_at,
                         created_at, modified_at"#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Anonymous lookup: only published reports resolve.
    pub async fn find_published_by_token(
        &self,
        token: Uuid,
    ) -> Result<Option<Report>, sqlx::Error> {
        sqlx::query_as::<_, Report>(
            r#"SELECT id, tenant_id, title, metrics, public_token, published_at,
                      created_at, modified_at
               FROM reports
               WHERE public_token = $1 AND published_at IS NOT NULL"#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
    }
}
