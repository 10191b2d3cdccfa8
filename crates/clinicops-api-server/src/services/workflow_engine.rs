use crate::database::models::{Deal, Patient, Stage, Tenant};
use crate::database::repositories::WorkflowRepository;
use crate::services::mailer::MailClient;
use crate::services::template::TemplateRenderer;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

/// What a single trigger run did. Failures are absorbed here, never bubbled.
/// A broken workflow must not roll back the stage change that fired it.
#[derive(Debug, Default, Serialize)]
pub struct WorkflowRunSummary {
    pub workflows_matched: usize,
    pub actions_run: usize,
    pub actions_failed: usize,
    pub emails_sent: usize,
    pub emails_scheduled: usize,
    pub emails_skipped: usize,
}

/// Occurrence `k` (1-based) of an action fires `delay_days * k` days after the
/// trigger. `repeat_count` is clamped to the configured ceiling.
pub fn expand_occurrences(
    now: DateTime<Utc>,
    delay_days: i32,
    repeat_count: i32,
    max_occurrences: u32,
) -> Vec<DateTime<Utc>> {
    let count = repeat_count.clamp(1, max_occurrences as i32);
    (1..=count as i64)
        .map(|k| now + Duration::days(delay_days as i64 * k))
        .collect()
}

pub struct WorkflowEngine {
    workflows: Arc<WorkflowRepository>,
    mailer: Arc<MailClient>,
    renderer: TemplateRenderer,
    max_occurrences: u32,
}

impl WorkflowEngine {
    pub fn new(
        workflows: Arc<WorkflowRepository>,
        mailer: Arc<MailClient>,
        max_occurrences: u32,
    ) -> Self {
        Self {
            workflows,
            mailer,
            renderer: TemplateRenderer::new(),
            max_occurrences,
        }
    }

    /// `deal-stage-changed` trigger: run every enabled workflow on the deal's
    /// new stage, synchronously and bounded.
    pub async fn on_deal_stage_changed(
        &self,
        deal: &Deal,
        patient: Option<&Patient>,
        stage: &Stage,
        tenant: &Tenant,
    ) -> WorkflowRunSummary {
        let mut summary = WorkflowRunSummary::default();

        let workflows = match self
            .workflows
            .enabled_for_stage(deal.tenant_id, stage.id)
            .await
        {
            Ok(workflows) => workflows,
            Err(e) => {
                error!("Failed to load workflows for stage {}: {}", stage.id, e);
                return summary;
            }
        };

        summary.workflows_matched = workflows.len();
        if workflows.is_empty() {
            return summary;
        }

        let context = render_context(deal, patient, stage, tenant);
        let recipient = patient.and_then(|p| p.email.as_deref());
        let now = Utc::now();

        for workflow in &workflows {
            let actions = match self.workflows.actions_for(workflow.id).await {
                Ok(actions) => actions,
                Err(e) => {
                    error!("Failed to load actions for workflow {}: {}", workflow.id, e);
                    summary.actions_failed += 1;
                    continue;
                }
            };

            for action in &actions {
                let (subject, body) = match (
                    self.renderer.render(&action.template_subject, &context),
                    self.renderer.render(&action.template_body, &context),
                ) {
                    (Ok(subject), Ok(body)) => (subject, body),
                    (Err(e), _) | (_, Err(e)) => {
                        warn!("Template render failed for action {}: {}", action.id, e);
                        summary.actions_failed += 1;
                        continue;
                    }
                };

                summary.actions_run += 1;

                let occurrences =
                    expand_occurrences(now, action.delay_days, action.repeat_count, self.max_occurrences);

                for send_at in occurrences {
                    let status = match recipient {
                        None => {
                            summary.emails_skipped += 1;
                            "skipped"
                        }
                        Some(to) if send_at <= now => {
                            match self.mailer.send(to, &subject, &body).await {
                                Ok(()) => {
                                    summary.emails_sent += 1;
                                    "sent"
                                }
                                Err(e) => {
                                    warn!("Mail send failed for deal {}: {}", deal.id, e);
                                    summary.actions_failed += 1;
                                    "failed"
                                }
                            }
                        }
                        Some(_) => {
                            summary.emails_scheduled += 1;
                            "scheduled"
                        }
                    };

                    if let Err(e) = self
                        .workflows
                        .record_outbox(
                            deal.tenant_id,
                            deal.id,
                            action.id,
                            recipient,
                            &subject,
                            &body,
                            send_at,
                            status,
                        )
                        .await
                    {
                        error!("Failed to record outbox row for action {}: {}", action.id, e);
                    }
                }
            }
        }

        info!(
            "Workflow trigger for deal {} on stage {}: {} matched, {} sent, {} scheduled",
            deal.id, stage.name, summary.workflows_matched, summary.emails_sent,
            summary.emails_scheduled
        );

        summary
    }
}

fn render_context(
    deal: &Deal,
    patient: Option<&Patient>,
    stage: &Stage,
    tenant: &Tenant,
) -> serde_json::Value {
    json!({
        "deal": {
            "title": deal.title,
            "value": format_cents(deal.value_cents),
        },
        "patient": patient.map(|p| json!({
            "name": p.name,
            "email": p.email,
        })),
        "stage": { "name": stage.name },
        "tenant": { "name": tenant.name },
    })
}

fn format_cents(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, (cents % 100).abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_is_bounded_by_max() {
        let now = Utc::now();
        let occurrences = expand_occurrences(now, 7, 100, 10);
        assert_eq!(occurrences.len(), 10);
    }

    #[test]
    fn test_expand_send_at_is_deterministic() {
        let now = Utc::now();
        let occurrences = expand_occurrences(now, 3, 4, 10);
        assert_eq!(occurrences.len(), 4);
        assert_eq!(occurrences[0], now + Duration::days(3));
        assert_eq!(occurrences[3], now + Duration::days(12));
    }

    #[test]
    fn test_zero_delay_is_due_now() {
        let now = Utc::now();
        let occurrences = expand_occurrences(now, 0, 3, 10);
        assert!(occurrences.iter().all(|t| *t == now));
    }

    #[test]
    fn test_repeat_count_floor_is_one() {
        let now = Utc::now();
        assert_eq!(expand_occurrences(now, 1, 0, 10).len(), 1);
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(120050), "1200.50");
        assert_eq!(format_cents(5), "0.05");
    }
}
