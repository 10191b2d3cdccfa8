use crate::auth::AuthUser;
use crate::database::models::Project;
use crate::database::repositories::ProjectRepository;
use crate::utils::error::ApiError;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

const STATUSES: [&str; 3] = ["active", "on_hold", "done"];

fn check_status(status: &str) -> Result<(), ApiError> {
    if STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "status must be one of {:?}",
            STATUSES
        )))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProjectPayload {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub deal_id: Option<Uuid>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "active".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ProjectListQuery {
    pub status: Option<String>,
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    Extension(projects): Extension<Arc<ProjectRepository>>,
    Json(payload): Json<ProjectPayload>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    payload.validate()?;
    check_status(&payload.status)?;

    let project = projects
        .create(user.tenant_id, &payload.name, payload.deal_id, &payload.status)
        .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    Extension(projects): Extension<Arc<ProjectRepository>>,
    Query(query): Query<ProjectListQuery>,
) -> Result<Json<Vec<Project>>, ApiError> {
    if let Some(status) = &query.status {
        check_status(status)?;
    }

    Ok(Json(
        projects.list(user.tenant_id, query.status.as_deref()).await?,
    ))
}

pub async fn get(
    Extension(user): Extension<AuthUser>,
    Extension(projects): Extension<Arc<ProjectRepository>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, ApiError> {
    let project = projects
        .find_by_id(user.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("project {}", id)))?;

    Ok(Json(project))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    Extension(projects): Extension<Arc<ProjectRepository>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProjectPayload>,
) -> Result<Json<Project>, ApiError> {
    payload.validate()?;
    check_status(&payload.status)?;

    let project = projects
        .update(
            user.tenant_id,
            id,
            &payload.name,
            payload.deal_id,
            &payload.status,
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("project {}", id)))?;

    Ok(Json(project))
}

pub async fn delete(
    Extension(user): Extension<AuthUser>,
    Extension(projects): Extension<Arc<ProjectRepository>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let removed = projects.soft_delete(user.tenant_id, id).await?;
    if !removed {
        return Err(ApiError::NotFound(format!("project {}", id)));
    }

    Ok(StatusCode::NO_CONTENT)
}
