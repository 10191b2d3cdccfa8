use crate::auth::AuthUser;
use crate::database::models::Patient;
use crate::database::repositories::PatientRepository;
use crate::utils::error::ApiError;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct PatientPayload {
    #[validate(length(min = 2, max = 200, message = "Name must be between 2 and 200 characters"))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PatientListQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    Extension(patients): Extension<Arc<PatientRepository>>,
    Json(payload): Json<PatientPayload>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    payload.validate()?;

    let patient = patients
        .create(
            user.tenant_id,
            &payload.name,
            payload.email.as_deref(),
            payload.phone.as_deref(),
            payload.notes.as_deref(),
        )
        .await?;

    info!("Patient {} created in tenant {}", patient.id, user.tenant_id);
    Ok((StatusCode::CREATED, Json(patient)))
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    Extension(patients): Extension<Arc<PatientRepository>>,
    Query(query): Query<PatientListQuery>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 100);
    let offset = query.offset.unwrap_or(0).max(0);

    let rows = patients
        .search(user.tenant_id, query.q.as_deref(), limit, offset)
        .await?;

    Ok(Json(rows))
}

pub async fn get(
    Extension(user): Extension<AuthUser>,
    Extension(patients): Extension<Arc<PatientRepository>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Patient>, ApiError> {
    let patient = patients
        .find_by_id(user.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("patient {}", id)))?;

    Ok(Json(patient))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    Extension(patients): Extension<Arc<PatientRepository>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PatientPayload>,
) -> Result<Json<Patient>, ApiError> {
    payload.validate()?;

    let patient = patients
        .update(
            user.tenant_id,
            id,
            &payload.name,
            payload.email.as_deref(),
            payload.phone.as_deref(),
            payload.notes.as_deref(),
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("patient {}", id)))?;

    Ok(Json(patient))
}

pub async fn delete(
    Extension(user): Extension<AuthUser>,
    Extension(patients): Extension<Arc<PatientRepository>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let removed = patients.soft_delete(user.tenant_id, id).await?;
    if !removed {
        return Err(ApiError::NotFound(format!("patient {}", id)));
    }

    Ok(StatusCode::NO_CONTENT)
}
