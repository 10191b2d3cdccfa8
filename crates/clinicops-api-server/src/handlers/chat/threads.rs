use super::{require_member, require_permission};
use crate::auth::AuthUser;
use crate::database::models::{perm, ChatChannel, ChatThread};
use crate::database::repositories::ChatRepository;
use crate::utils::error::ApiError;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateThreadRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 4000))]
    pub first_message: String,
}

#[derive(Debug, Serialize)]
pub struct ThreadResponse {
    pub thread: ChatThread,
    pub channel: ChatChannel,
}

/// Parent channel must be a regular text channel in a server the caller
/// belongs to. Threads cannot nest under threads or DMs.
async fn parent_channel(
    chat: &ChatRepository,
    user: &AuthUser,
    channel_id: Uuid,
) -> Result<(ChatChannel, Uuid), ApiError> {
    let channel = chat
        .find_channel(channel_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("channel {}", channel_id)))?;

    let server_id = channel
        .server_id
        .filter(|_| channel.kind == "text")
        .ok_or_else(|| {
            ApiError::BadRequest("threads can only be opened under text channels".to_string())
        })?;

    chat.find_server(user.tenant_id, server_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("channel {}", channel_id)))?;

    Ok((channel, server_id))
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    Extension(chat): Extension<Arc<ChatRepository>>,
    Path(channel_id): Path<Uuid>,
    Json(payload): Json<CreateThreadRequest>,
) -> Result<(StatusCode, Json<ThreadResponse>), ApiError> {
    payload.validate()?;

    let (parent, server_id) = parent_channel(&chat, &user, channel_id).await?;
    require_permission(&chat, server_id, user.user_id, perm::SEND_MESSAGES).await?;

    let (thread, channel) = chat
        .create_thread(
            server_id,
            parent.id,
            &payload.title,
            user.user_id,
            &payload.first_message,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ThreadResponse { thread, channel })))
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    Extension(chat): Extension<Arc<ChatRepository>>,
    Path(channel_id): Path<Uuid>,
) -> Result<Json<Vec<ChatThread>>, ApiError> {
    let (parent, server_id) = parent_channel(&chat, &user, channel_id).await?;
    require_member(&chat, server_id, user.user_id).await?;

    Ok(Json(chat.list_threads(parent.id).await?))
}
