use crate::auth::AuthUser;
use crate::database::models::{Deal, Stage};
use crate::database::repositories::{DealRepository, PatientRepository, UserRepository};
use crate::services::{WorkflowEngine, WorkflowRunSummary};
use crate::utils::error::ApiError;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

// Stages

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStageRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub position: i32,
}

pub async fn create_stage(
    Extension(user): Extension<AuthUser>,
    Extension(deals): Extension<Arc<DealRepository>>,
    Json(payload): Json<CreateStageRequest>,
) -> Result<(StatusCode, Json<Stage>), ApiError> {
    if !user.is_admin() {
        return Err(ApiError::Forbidden("admin role required".to_string()));
    }
    payload.validate()?;

    let stage = deals
        .create_stage(user.tenant_id, &payload.name, payload.position)
        .await?;

    Ok((StatusCode::CREATED, Json(stage)))
}

pub async fn list_stages(
    Extension(user): Extension<AuthUser>,
    Extension(deals): Extension<Arc<DealRepository>>,
) -> Result<Json<Vec<Stage>>, ApiError> {
    Ok(Json(deals.list_stages(user.tenant_id).await?))
}

// Deals

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDealRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub patient_id: Option<Uuid>,
    pub stage_id: Uuid,
    #[serde(default)]
    pub value_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct DealListQuery {
    pub stage_id: Option<Uuid>,
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    Extension(deals): Extension<Arc<DealRepository>>,
    Json(payload): Json<CreateDealRequest>,
) -> Result<(StatusCode, Json<Deal>), ApiError> {
    payload.validate()?;
    if payload.value_cents < 0 {
        return Err(ApiError::Validation("value_cents must be >= 0".to_string()));
    }

    // Stage must belong to the caller's tenant
    deals
        .find_stage(user.tenant_id, payload.stage_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("unknown stage".to_string()))?;

    let deal = deals
        .create(
            user.tenant_id,
            &payload.title,
            payload.patient_id,
            payload.stage_id,
            payload.value_cents,
        )
        .await?;

    info!("Deal {} created in tenant {}", deal.id, user.tenant_id);
    Ok((StatusCode::CREATED, Json(deal)))
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    Extension(deals): Extension<Arc<DealRepository>>,
    Query(query): Query<DealListQuery>,
) -> Result<Json<Vec<Deal>>, ApiError> {
    Ok(Json(deals.list(user.tenant_id, query.stage_id).await?))
}

pub async fn get(
    Extension(user): Extension<AuthUser>,
    Extension(deals): Extension<Arc<DealRepository>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Deal>, ApiError> {
    let deal = deals
        .find_by_id(user.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("deal {}", id)))?;

    Ok(Json(deal))
}

// Stage change + workflow trigger

#[derive(Debug, Deserialize)]
pub struct ChangeStageRequest {
    pub stage_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ChangeStageResponse {
    pub deal: Deal,
    pub triggered: usize,
    #[serde(flatten)]
    pub run: WorkflowRunSummary,
}

pub async fn change_stage(
    Extension(user): Extension<AuthUser>,
    Extension(deals): Extension<Arc<DealRepository>>,
    Extension(patients): Extension<Arc<PatientRepository>>,
    Extension(users): Extension<Arc<UserRepository>>,
    Extension(engine): Extension<Arc<WorkflowEngine>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeStageRequest>,
) -> Result<Json<ChangeStageResponse>, ApiError> {
    let deal = deals
        .find_by_id(user.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("deal {}", id)))?;

    let stage = deals
        .find_stage(user.tenant_id, payload.stage_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("unknown stage".to_string()))?;

    // Re-dropping a deal on its current stage is a no-op, not a re-trigger.
    if deal.stage_id == stage.id {
        return Ok(Json(ChangeStageResponse {
            deal,
            triggered: 0,
            run: WorkflowRunSummary::default(),
        }));
    }

    let deal = deals.set_stage(user.tenant_id, id, stage.id).await?;

    info!(
        "Deal {} moved to stage '{}' in tenant {}",
        deal.id, stage.name, user.tenant_id
    );

    let tenant = users
        .tenant_by_id(user.tenant_id)
        .await?
        .ok_or_else(|| ApiError::Internal("tenant row missing".to_string()))?;

    let patient = match deal.patient_id {
        Some(patient_id) => patients.find_by_id(user.tenant_id, patient_id).await?,
        None => None,
    };

    let run = engine
        .on_deal_stage_changed(&deal, patient.as_ref(), &stage, &tenant)
        .await;

    Ok(Json(ChangeStageResponse {
        deal,
        triggered: run.workflows_matched,
        run,
    }))
}
