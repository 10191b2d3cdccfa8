use crate::database::models::{Workflow, WorkflowAction};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Action payload accepted on workflow create/update. Positions come from
/// list order.
#[derive(Debug, Clone)]
pub struct NewAction {
    pub template_subject: String,
    pub template_body: String,
    pub delay_days: i32,
    pub repeat_count: i32,
}

pub struct WorkflowRepository {
    pool: PgPool,
}

impl WorkflowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        name: &str,
        stage_id: Uuid,
        enabled: bool,
        actions: &[NewAction],
    ) -> Result<(Workflow, Vec<WorkflowAction>), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let workflow = sqlx::query_as::<_, Workflow>(
            r#"INSERT INTO workflows (id, tenant_id, name, stage_id, enabled, created_at)
               VALUES ($1, $2, $3, $4, $5, NOW())
               RETURNING id, tenant_id, name, stage_id, enabled, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(name)
        .bind(stage_id)
        .bind(enabled)
        .fetch_one(&mut *tx)
        .await?;

        let mut created = Vec::with_capacity(actions.len());
        for (position, action) in actions.iter().enumerate() {
            let row = sqlx::query_as::<_, WorkflowAction>(
                r#"INSERT INTO workflow_actions
                       (id, workflow_id, position, template_subject, template_body, delay_days, repeat_count)
                   VALUES ($1, $2, $3, $4, $5, $6, $7)
                   RETURNING id, workflow_id, position, template_subject, template_body, delay_days, repeat_count"#,
            )
            .bind(Uuid::new_v4())
            .bind(workflow.id)
            .bind(position as i32)
            .bind(&action.template_subject)
            .bind(&action.template_body)
            .bind(action.delay_days)
            .bind(action.repeat_count)
            .fetch_one(&mut *tx)
            .await?;
            created.push(row);
        }

        tx.commit().await?;
        Ok((workflow, created))
    }

    pub async fn list(&self, tenant_id: Uuid) -> Result<Vec<Workflow>, sqlx::Error> {
        sqlx::query_as::<_, Workflow>(
            r#"SELECT id, tenant_id, name, stage_id, enabled, created_at
               FROM workflows WHERE tenant_id = $1
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
    ) -> Result<Option<Workflow>, sqlx::Error> {
        sqlx::query_as::<_, Workflow>(
            r#"SELECT id, tenant_id, name, stage_id, enabled, created_at
               FROM workflows WHERE tenant_id = $1 AND id = $2"#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn actions_for(&self, workflow_id: Uuid) -> Result<Vec<WorkflowAction>, sqlx::Error> {
        sqlx::query_as::<_, WorkflowAction>(
            r#"SELECT id, workflow_id, position, template_subject, template_body, delay_days, repeat_count
               FROM workflow_actions WHERE workflow_id = $1
               ORDER BY position"#,
        )
        .bind(workflow_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Full update: workflow fields plus a replacement action list.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        name: &str,
        stage_id: Uuid,
        enabled: bool,
        actions: &[NewAction],
    ) -> Result<Option<(Workflow, Vec<WorkflowAction>)>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let workflow = sqlx::query_as::<_, Workflow>(
            r#"UPDATE workflows SET name = $3, stage_id = $4, enabled = $5
               WHERE tenant_id = $1 AND id = $2
               RETURNING id, tenant_id, name, stage_id, enabled, created_at"#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(name)
        .bind(stage_id)
        .bind(enabled)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(workflow) = workflow else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM workflow_actions WHERE workflow_id = $1")
            .bind(workflow.id)
            .execute(&mut *tx)
            .await?;

        let mut created = Vec::with_capacity(actions.len());
        for (position, action) in actions.iter().enumerate() {
            let row = sqlx::query_as::<_, WorkflowAction>(
                r#"INSERT INTO workflow_actions
                       (id, workflow_id, position, template_subject, template_body, delay_days, repeat_count)
                   VALUES ($1, $2, $3, $4, $5, $6, $7)
                   RETURNING id, workflow_id, position, template_subject, template_body, delay_days, repeat_count"#,
            )
            .bind(Uuid::new_v4())
            .bind(workflow.id)
            .bind(position as i32)
            .bind(&action.template_subject)
            .bind(&action.template_body)
            .bind(action.delay_days)
            .bind(action.repeat_count)
            .fetch_one(&mut *tx)
            .await?;
            created.push(row);
        }

        tx.commit().await?;
        Ok(Some((workflow, created)))
    }

    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM workflows WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Enabled workflows triggered by a deal entering the given stage.
    pub async fn enabled_for_stage(
        &self,
        tenant_id: Uuid,
        stage_id: Uuid,
    ) -> Result<Vec<Workflow>, sqlx::Error> {
        sqlx::query_as::<_, Workflow>(
            r#"SELECT id, tenant_id, name, stage_id, enabled, created_at
               FROM workflows
               WHERE tenant_id = $1 AND stage_id = $2 AND enabled
               ORDER BY created_at"#,
        )
        .bind(tenant_id)
        .bind(stage_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn record_outbox(
        &self,
        tenant_id: Uuid,
        deal_id: Uuid,
        action_id: Uuid,
        recipient: Option<&str>,
        subject: &str,
        body: &str,
        send_at: DateTime<Utc>,
        status: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO email_outbox
                   (tenant_id, deal_id, action_id, recipient, subject, body, send_at, status)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(tenant_id)
        .bind(deal_id)
        .bind(action_id)
        .bind(recipient)
        .bind(subject)
        .bind(body)
        .bind(send_at)
        .bind(status)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
