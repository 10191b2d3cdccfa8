use crate::database::models::Patient;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PatientRepository {
    pool: PgPool,
}

impl PatientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Patient, sqlx::Error> {
        sqlx::query_as::<_, Patient>(
            r#"INSERT INTO patients (id, tenant_id, name, email, phone, notes, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, NOW())
               RETURNING id, tenant_id, name, email, phone, notes, created_at, modified_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(notes)
        .fetch_one(&self.pool)
        .await
    }

    /// Listing with optional ILIKE search on name/email, newest first.
    pub async fn search(
        &self,
        tenant_id: Uuid,
        query: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Patient>, sqlx::Error> {
        let pattern = query.map(|q| format!("%{}%", q));

        sqlx::query_as::<_, Patient>(
            r#"SELECT id, tenant_id, name, email, phone, notes, created_at, modified_at
               FROM patients
               WHERE tenant_id = $1
                 AND removed_at IS NULL
                 AND ($2::text IS NULL OR name ILIKE $2 OR email ILIKE $2)
               ORDER BY created_at DESC
               LIMIT $3 OFFSET $4"#,
        )
        .bind(tenant_id)
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Patient>, sqlx::Error> {
        sqlx::query_as::<_, Patient>(
            r#"SELECT id, tenant_id, name, email, phone, notes, created_at, modified_at
               FROM patients
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
        email: Option<&str>,
        phone: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Option<Patient>, sqlx::Error> {
        sqlx::query_as::<_, Patient>(
            r#"UPDATE patients
               SET name = $3, email = $4, phone = $5, notes = $6, modified_at = $7
               WHERE tenant_id = $1 AND id = $2 AND removed_at IS NULL
               RETURNING id, tenant_id, name, email, phone, notes, created_at, modified_at"#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(notes)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn soft_delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE patients SET removed_at = NOW()
               WHERE tenant_id = $1 AND id = $2 AND removed_at IS NULL"#,
        )
        .bind(tenant_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
