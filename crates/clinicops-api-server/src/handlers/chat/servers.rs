use crate::auth::AuthUser;
use crate::database::models::{ChatChannel, ChatServer};
use crate::database::repositories::ChatRepository;
use crate::utils::error::ApiError;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateServerRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CreateServerResponse {
    pub server: ChatServer,
    pub default_channel: ChatChannel,
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    Extension(chat): Extension<Arc<ChatRepository>>,
    Json(payload): Json<CreateServerRequest>,
) -> Result<(StatusCode, Json<CreateServerResponse>), ApiError> {
    payload.validate()?;

    let (server, default_channel) = chat
        .create_server(user.tenant_id, &payload.name, user.user_id)
        .await?;

    info!(
        "Chat server {} created by {} in tenant {}",
        server.id, user.user_id, user.tenant_id
    );
    Ok((
        StatusCode::CREATED,
        Json(CreateServerResponse {
            server,
            default_channel,
        }),
    ))
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    Extension(chat): Extension<Arc<ChatRepository>>,
) -> Result<Json<Vec<ChatServer>>, ApiError> {
    Ok(Json(
        chat.list_servers_for(user.tenant_id, user.user_id).await?,
    ))
}

#[derive(Debug, Serialize)]
pub struct AcceptInviteResponse {
    pub server: ChatServer,
    pub already_member: bool,
}

/// Accepting twice is fine, the existing membership is kept.
pub async fn accept_invite(
    Extension(user): Extension<AuthUser>,
    Extension(chat): Extension<Arc<ChatRepository>>,
    Path(code): Path<String>,
) -> Result<Json<AcceptInviteResponse>, ApiError> {
    let server = chat
        .server_by_invite(user.tenant_id, &code)
        .await?
        .ok_or_else(|| ApiError::NotFound("invite".to_string()))?;

    if chat.membership(server.id, user.user_id).await?.is_some() {
        return Ok(Json(AcceptInviteResponse {
            server,
            already_member: true,
        }));
    }

    let member_role = chat
        .role_by_name(server.id, "member")
        .await?
        .ok_or_else(|| ApiError::Internal("default member role missing".to_string()))?;

    chat.add_member(server.id, user.user_id, member_role.id)
        .await?;

    info!("User {} joined server {} via invite", user.user_id, server.id);
    Ok(Json(AcceptInviteResponse {
        server,
        already_member: false,
    }))
}
