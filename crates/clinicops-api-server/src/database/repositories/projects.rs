use crate::database::models::Project;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        name: &str,
        deal_id: Option<Uuid>,
        status: &str,
    ) -> Result<Project, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"INSERT INTO projects (id, tenant_id, name, deal_id, status, created_at)
               VALUES ($1, $2, $3, $4, $5, NOW())
               RETURNING id, tenant_id, name, deal_id, status, created_at, modified_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(name)
        .bind(deal_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        status: Option<&str>,
    ) -> Result<Vec<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"SELECT id, tenant_id, name, deal_id, status, created_at, modified_at
               FROM projects
               WHERE tenant_id = $1 AND removed_at IS NULL
                 AND ($2::text IS NULL OR status = $2)
               ORDER BY created_at DESC"#,
        )
        .bind(tenant_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"SELECT id, tenant_id, name, deal_id, status, created_at, modified_at
               FROM projects
               WHERE tenant_id = $1 AND id = $2 AND removed_at IS NULL"#,
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
        name: &str,
        deal_id: Option<Uuid>,
        status: &str,
    ) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"UPDATE projects
               SET name = $3, deal_id = $4, status = $5, modified_at = $6
               WHERE tenant_id = $1 AND id = $2 AND removed_at IS NULL
               RETURNING id, tenant_id, name, deal_id, status, created_at, modified_at"#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(name)
        .bind(deal_id)
        .bind(status)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn soft_delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE projects SET removed_at = NOW()
               WHERE tenant_id = $1 AND id = $2 AND removed_at IS NULL"#,
        )
        .bind(tenant_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
