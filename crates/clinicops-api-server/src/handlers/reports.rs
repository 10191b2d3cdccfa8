use crate::auth::AuthUser;
use crate::database::models::Report;
use crate::database::repositories::ReportRepository;
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
pub struct ReportPayload {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    pub metrics: serde_json::Value,
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    Extension(reports): Extension<Arc<ReportRepository>>,
    Json(payload): Json<ReportPayload>,
) -> Result<(StatusCode, Json<Report>), ApiError> {
    payload.validate()?;

    let report = reports
        .create(user.tenant_id, &payload.title, payload.metrics)
        .await?;

    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    Extension(reports): Extension<Arc<ReportRepository>>,
) -> Result<Json<Vec<Report>>, ApiError> {
    Ok(Json(reports.list(user.tenant_id).await?))
}

pub async fn get(
    Extension(user): Extension<AuthUser>,
    Extension(reports): Extension<Arc<ReportRepository>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Report>, ApiError> {
    let report = reports
        .find_by_id(user.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("report {}", id)))?;

    Ok(Json(report))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    Extension(reports): Extension<Arc<ReportRepository>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReportPayload>,
) -> Result<Json<Report>, ApiError> {
    payload.validate()?;

    let report = reports
        .update(user.tenant_id, id, &payload.title, payload.metrics)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("report {}", id)))?;

    Ok(Json(report))
}

pub async fn publish(
    Extension(user): Extension<AuthUser>,
    Extension(reports): Extension<Arc<ReportRepository>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Report>, ApiError> {
    let report = reports
        .publish(user.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("report {}", id)))?;

    info!("Report {} published in tenant {}", report.id, user.tenant_id);
    Ok(Json(report))
}

pub async fn unpublish(
    Extension(user): Extension<AuthUser>,
    Extension(reports): Extension<Arc<ReportRepository>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Report>, ApiError> {
    let report = reports
        .unpublish(user.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("report {}", id)))?;

    Ok(Json(report))
}

/// Anonymous payload: no tenant internals, no token echo.
#[derive(Debug, Serialize)]
pub struct PublicReport {
    pub title: String,
    pub metrics: serde_json::Value,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

pub async fn get_public(
    Extension(reports): Extension<Arc<ReportRepository>>,
    Path(token): Path<Uuid>,
) -> Result<Json<PublicReport>, ApiError> {
    let report = reports
        .find_published_by_token(token)
        .await?
        .ok_or_else(|| ApiError::NotFound("report".to_string()))?;

    let published_at = report
        .published_at
        .ok_or_else(|| ApiError::Internal("published report missing timestamp".to_string()))?;

    Ok(Json(PublicReport {
        title: report.title,
        metrics: report.metrics,
        published_at,
    }))
}
