use crate::database::models::Invoice;
use sqlx::PgPool;
use uuid::Uuid;

pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert with the next per-tenant invoice number, assigned inside the
    /// same transaction as the insert.
    pub async fn create(
        &self,
        tenant_id: Uuid,
        patient_id: Uuid,
        total_cents: i64,
        line_items: serde_json::Value,
    ) -> Result<Invoice, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let number: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(number), 0) + 1 FROM invoices WHERE tenant_id = $1",
        )
        .bind(tenant_id)
        .fetch_one(&mut *tx)
        .await?;

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"INSERT INTO invoices
                   (id, tenant_id, number, patient_id, status, total_cents, line_items, created_at)
               VALUES ($1, $2, $3, $4, 'draft', $5, $6, NOW())
               RETURNING id, tenant_id, number, patient_id, status, total_cents, line_items,
                         created_at, paid_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(number)
        .bind(patient_id)
        .bind(total_cents)
        .bind(line_items)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(invoice)
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        status: Option<&str>,
    ) -> Result<Vec<Invoice>, sqlx::Error> {
        sqlx::query_as::<_, Invoice>(
            r#"SELECT id, tenant_id, number, patient_id, status, total_cents, line_items,
                      created_at, paid_at
               FROM invoices
               WHERE tenant_id = $1 AND ($2::text IS NULL OR status = $2)
               ORDER BY number DESC"#,
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
    ) -> Result<Option<Invoice>, sqlx::Error> {
        sqlx::query_as::<_, Invoice>(
            r#"SELECT id, tenant_id, number, patient_id, status, total_cents, line_items,
                      created_at, paid_at
               FROM invoices WHERE tenant_id = $1 AND id = $2"#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Guarded in SQL on the status the caller validated against, so two
    /// concurrent transitions cannot both win. None when the row moved on.
    pub async fn set_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        status: &str,
        expected_from: &str,
        mark_paid: bool,
    ) -> Result<Option<Invoice>, sqlx::Error> {
        sqlx::query_as::<_, Invoice>(
            r#"UPDATE invoices
               SET status = $3,
                   paid_at = CASE WHEN $5 THEN NOW() ELSE paid_at END
               WHERE tenant_id = $1 AND id = $2 AND status = $4
               RETURNING id, tenant_id, number, patient_id, status, total_cents, line_items,
                         created_at, paid_at"#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(status)
        .bind(expected_from)
        .bind(mark_paid)
        .fetch_optional(&self.pool)
        .await
    }
}
