use crate::auth::AuthUser;
use crate::database::models::DmChannel;
use crate::database::repositories::{ChatRepository, UserRepository};
use crate::utils::error::ApiError;
use axum::{extract::Extension, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct OpenDmRequest {
    pub other_user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct OpenDmResponse {
    pub channel: DmChannel,
    pub created: bool,
}

/// Opening a DM is idempotent: the second call returns the existing
/// channel with `created: false`.
pub async fn open(
    Extension(user): Extension<AuthUser>,
    Extension(chat): Extension<Arc<ChatRepository>>,
    Extension(users): Extension<Arc<UserRepository>>,
    Json(payload): Json<OpenDmRequest>,
) -> Result<(StatusCode, Json<OpenDmResponse>), ApiError> {
    if payload.other_user_id == user.user_id {
        return Err(ApiError::BadRequest(
            "cannot open a conversation with yourself".to_string(),
        ));
    }

    users
        .find_by_id(user.tenant_id, payload.other_user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user".to_string()))?;

    let (channel, created) = chat
        .open_dm(user.tenant_id, user.user_id, payload.other_user_id)
        .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(OpenDmResponse { channel, created })))
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    Extension(chat): Extension<Arc<ChatRepository>>,
) -> Result<Json<Vec<DmChannel>>, ApiError> {
    Ok(Json(chat.list_dms_for(user.user_id).await?))
}
