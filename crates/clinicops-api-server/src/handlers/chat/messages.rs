use super::{require_member, require_permission};
use crate::auth::AuthUser;
use crate::database::models::{perm, ChatChannel, ChatMessageRow};
use crate::database::repositories::ChatRepository;
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

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

/// Resolve a channel and check the caller may read it. Server channels
/// need membership in a same-tenant server; DM channels need the caller
/// to be one of the two participants.
async fn readable_channel(
    chat: &ChatRepository,
    user: &AuthUser,
    channel_id: Uuid,
) -> Result<ChatChannel, ApiError> {
    let channel = chat
        .find_channel(channel_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("channel {}", channel_id)))?;

    match channel.server_id {
        Some(server_id) => {
            chat.find_server(user.tenant_id, server_id)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("channel {}", channel_id)))?;
            require_member(chat, server_id, user.user_id).await?;
        }
        None => {
            let dm = chat
                .dm_for_channel(channel.id)
                .await?
                .filter(|dm| dm.tenant_id == user.tenant_id)
                .ok_or_else(|| ApiError::NotFound(format!("channel {}", channel_id)))?;
            if dm.user_a != user.user_id && dm.user_b != user.user_id {
                return Err(ApiError::Forbidden(
                    "not a participant of this conversation".to_string(),
                ));
            }
        }
    }

    Ok(channel)
}

/// Like `readable_channel`, but posting to a server channel also needs
/// the send-messages permission bit.
async fn writable_channel(
    chat: &ChatRepository,
    user: &AuthUser,
    channel_id: Uuid,
) -> Result<ChatChannel, ApiError> {
    let channel = readable_channel(chat, user, channel_id).await?;

    if let Some(server_id) = channel.server_id {
        require_permission(chat, server_id, user.user_id, perm::SEND_MESSAGES).await?;
    }

    Ok(channel)
}

#[derive(Debug, Deserialize, Validate)]
pub struct PostMessageRequest {
    #[validate(length(min = 1, max = 4000))]
    pub body: String,
}

pub async fn post(
    Extension(user): Extension<AuthUser>,
    Extension(chat): Extension<Arc<ChatRepository>>,
    Path(channel_id): Path<Uuid>,
    Json(payload): Json<PostMessageRequest>,
) -> Result<(StatusCode, Json<ChatMessageRow>), ApiError> {
    payload.validate()?;
    let channel = writable_channel(&chat, &user, channel_id).await?;

    let message = chat
        .create_message(channel.id, user.user_id, &payload.body)
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

#[derive(Debug, Deserialize)]
pub struct MessageListQuery {
    pub after: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    Extension(chat): Extension<Arc<ChatRepository>>,
    Path(channel_id): Path<Uuid>,
    Query(query): Query<MessageListQuery>,
) -> Result<Json<Vec<ChatMessageRow>>, ApiError> {
    let channel = readable_channel(&chat, &user, channel_id).await?;

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let messages = chat.list_messages(channel.id, query.after, limit).await?;

    Ok(Json(messages))
}
