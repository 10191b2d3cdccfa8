use super::{require_member, require_permission, server_in_tenant};
use crate::auth::AuthUser;
use crate::database::models::{perm, ChatChannel};
use crate::database::repositories::ChatRepository;
use crate::utils::error::ApiError;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ChannelPayload {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    Extension(chat): Extension<Arc<ChatRepository>>,
    Path(server_id): Path<Uuid>,
) -> Result<Json<Vec<ChatChannel>>, ApiError> {
    let server = server_in_tenant(&chat, &user, server_id).await?;
    require_member(&chat, server.id, user.user_id).await?;

    Ok(Json(chat.list_channels(server.id).await?))
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    Extension(chat): Extension<Arc<ChatRepository>>,
    Path(server_id): Path<Uuid>,
    Json(payload): Json<ChannelPayload>,
) -> Result<(StatusCode, Json<ChatChannel>), ApiError> {
    payload.validate()?;
    let server = server_in_tenant(&chat, &user, server_id).await?;
    require_permission(&chat, server.id, user.user_id, perm::MANAGE_CHANNELS).await?;

    let channel = chat.create_channel(server.id, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(channel)))
}

pub async fn rename(
    Extension(user): Extension<AuthUser>,
    Extension(chat): Extension<Arc<ChatRepository>>,
    Path((server_id, channel_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ChannelPayload>,
) -> Result<Json<ChatChannel>, ApiError> {
    payload.validate()?;
    let server = server_in_tenant(&chat, &user, server_id).await?;
    require_permission(&chat, server.id, user.user_id, perm::MANAGE_CHANNELS).await?;

    let channel = chat
        .rename_channel(server.id, channel_id, &payload.name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("channel {}", channel_id)))?;

    Ok(Json(channel))
}

pub async fn delete(
    Extension(user): Extension<AuthUser>,
    Extension(chat): Extension<Arc<ChatRepository>>,
    Path((server_id, channel_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let server = server_in_tenant(&chat, &user, server_id).await?;
    require_permission(&chat, server.id, user.user_id, perm::MANAGE_CHANNELS).await?;

    let deleted = chat.delete_channel(server.id, channel_id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("channel {}", channel_id)));
    }

    Ok(StatusCode::NO_CONTENT)
}
