use crate::auth::AuthUser;
use crate::database::models::{Workflow, WorkflowAction};
use crate::database::repositories::workflows::NewAction;
use crate::database::repositories::{DealRepository, WorkflowRepository};
use crate::utils::error::ApiError;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ActionPayload {
    #[validate(length(min = 1, max = 500))]
    pub template_subject: String,
    #[validate(length(min = 1))]
    pub template_body: String,
    #[serde(default)]
    pub delay_days: i32,
    #[serde(default = "default_repeat")]
    pub repeat_count: i32,
}

fn default_repeat() -> i32 {
    1
}

#[derive(Debug, Deserialize, Validate)]
pub struct WorkflowPayload {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub stage_id: Uuid,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[validate(nested)]
    pub actions: Vec<ActionPayload>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct WorkflowResponse {
    #[serde(flatten)]
    pub workflow: Workflow,
    pub actions: Vec<WorkflowAction>,
}

fn to_new_actions(payload: &WorkflowPayload, max_occurrences: u32) -> Result<Vec<NewAction>, ApiError> {
    if payload.actions.is_empty() {
        return Err(ApiError::Validation(
            "workflow needs at least one action".to_string(),
        ));
    }

    payload
        .actions
        .iter()
        .map(|a| {
            if a.delay_days < 0 {
                return Err(ApiError::Validation("delay_days must be >= 0".to_string()));
            }
            if a.repeat_count < 1 {
                return Err(ApiError::Validation("repeat_count must be >= 1".to_string()));
            }
            Ok(NewAction {
                template_subject: a.template_subject.clone(),
                template_body: a.template_body.clone(),
                delay_days: a.delay_days,
                repeat_count: a.repeat_count.min(max_occurrences as i32),
            })
        })
        .collect()
}

/// Per-handler knob injected from config so repeat_count clamping matches the
/// engine's ceiling.
#[derive(Clone, Copy)]
pub struct WorkflowLimits {
    pub max_occurrences: u32,
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    Extension(workflows): Extension<Arc<WorkflowRepository>>,
    Extension(deals): Extension<Arc<DealRepository>>,
    Extension(limits): Extension<WorkflowLimits>,
    Json(payload): Json<WorkflowPayload>,
) -> Result<(StatusCode, Json<WorkflowResponse>), ApiError> {
    if !user.is_admin() {
        return Err(ApiError::Forbidden("admin role required".to_string()));
    }
    payload.validate()?;

    deals
        .find_stage(user.tenant_id, payload.stage_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("unknown stage".to_string()))?;

    let actions = to_new_actions(&payload, limits.max_occurrences)?;
    let (workflow, actions) = workflows
        .create(
            user.tenant_id,
            &payload.name,
            payload.stage_id,
            payload.enabled,
            &actions,
        )
        .await?;

    info!("Workflow {} created in tenant {}", workflow.id, user.tenant_id);
    Ok((
        StatusCode::CREATED,
        Json(WorkflowResponse { workflow, actions }),
    ))
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    Extension(workflows): Extension<Arc<WorkflowRepository>>,
) -> Result<Json<Vec<Workflow>>, ApiError> {
    Ok(Json(workflows.list(user.tenant_id).await?))
}

pub async fn get(
    Extension(user): Extension<AuthUser>,
    Extension(workflows): Extension<Arc<WorkflowRepository>>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    let workflow = workflows
        .find_by_id(user.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("workflow {}", id)))?;

    let actions = workflows.actions_for(workflow.id).await?;
    Ok(Json(WorkflowResponse { workflow, actions }))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    Extension(workflows): Extension<Arc<WorkflowRepository>>,
    Extension(deals): Extension<Arc<DealRepository>>,
    Extension(limits): Extension<WorkflowLimits>,
    Path(id): Path<Uuid>,
    Json(payload): Json<WorkflowPayload>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    if !user.is_admin() {
        return Err(ApiError::Forbidden("admin role required".to_string()));
    }
    payload.validate()?;

    deals
        .find_stage(user.tenant_id, payload.stage_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("unknown stage".to_string()))?;

    let actions = to_new_actions(&payload, limits.max_occurrences)?;
    let (workflow, actions) = workflows
        .update(
            user.tenant_id,
            id,
            &payload.name,
            payload.stage_id,
            payload.enabled,
            &actions,
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("workflow {}", id)))?;

    Ok(Json(WorkflowResponse { workflow, actions }))
}

pub async fn delete(
    Extension(user): Extension<AuthUser>,
    Extension(workflows): Extension<Arc<WorkflowRepository>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !user.is_admin() {
        return Err(ApiError::Forbidden("admin role required".to_string()));
    }

    let deleted = workflows.delete(user.tenant_id, id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("workflow {}", id)));
    }

    Ok(StatusCode::NO_CONTENT)
}
