use crate::database::models::{Ticket, TicketMessage};
use sqlx::PgPool;
use uuid::Uuid;

pub struct TicketRepository {
    pool: PgPool,
}

impl TicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ticket plus its opening visitor message, atomically.
    pub async fn create(
        &self,
        tenant_id: Uuid,
        subject: &str,
        body: &str,
        visitor_name: &str,
        visitor_email: &str,
    ) -> Result<Ticket, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let ticket = sqlx::query_as::<_, Ticket>(
            r#"INSERT INTO tickets
                   (id, tenant_id, subject, status, visitor_name, visitor_email, visitor_key, created_at)
               VALUES ($1, $2, $3, 'open', $4, $5, $6, NOW())
               RETURNING id, tenant_id, subject, status, visitor_name, visitor_email,
                         visitor_key, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(subject)
        .bind(visitor_name)
        .bind(visitor_email)
        .bind(Uuid::new_v4())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"INSERT INTO ticket_messages (ticket_id, author, author_id, body)
               VALUES ($1, 'visitor', NULL, $2)"#,
        )
        .bind(ticket.id)
        .bind(body)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ticket)
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        status: Option<&str>,
    ) -> Result<Vec<Ticket>, sqlx::Error> {
        sqlx::query_as::<_, Ticket>(
            r#"SELECT id, tenant_id, subject, status, visitor_name, visitor_email,
                      visitor_key, created_at
               FROM tickets
               WHERE tenant_id = $1 AND ($2::text IS NULL OR status = $2)
               ORDER BY created_at DESC"#,
        )
        .bind(tenant_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>, sqlx::Error> {
        sqlx::query_as::<_, Ticket>(
            r#"SELECT id, tenant_id, subject, status, visitor_name, visitor_email,
                      visitor_key, created_at
               FROM tickets WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn set_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        status: &str,
    ) -> Result<Option<Ticket>, sqlx::Error> {
        sqlx::query_as::<_, Ticket>(
            r#"UPDATE tickets SET status = $3
               WHERE tenant_id = $1 AND id = $2
               RETURNING id, tenant_id, subject, status, visitor_name, visitor_email,
                         visitor_key, created_at"#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn add_message(
        &self,
        ticket_id: Uuid,
        author: &str,
        author_id: Option<Uuid>,
        body: &str,
    ) -> Result<TicketMessage, sqlx::Error> {
        sqlx::query_as::<_, TicketMessage>(
            r#"INSERT INTO ticket_messages (ticket_id, author, author_id, body)
               VALUES ($1, $2, $3, $4)
               RETURNING id, ticket_id, author, author_id, body, created_at"#,
        )
        .bind(ticket_id)
        .bind(author)
        .bind(author_id)
        .bind(body)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list_messages(&self, ticket_id: Uuid) -> Result<Vec<TicketMessage>, sqlx::Error> {
        sqlx::query_as::<_, TicketMessage>(
            r#"SELECT id, ticket_id, author, author_id, body, created_at
               FROM ticket_messages WHERE ticket_id = $1
               ORDER BY id"#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await
    }
}
