pub mod channels;
pub mod dms;
pub mod messages;
pub mod roles;
pub mod servers;
pub mod threads;

use crate::auth::AuthUser;
use crate::database::models::{perm, ChatServer};
use crate::database::repositories::ChatRepository;
use crate::utils::error::ApiError;
use uuid::Uuid;

/// Server scoped to the caller's tenant, 404 otherwise.
pub(crate) async fn server_in_tenant(
    chat: &ChatRepository,
    user: &AuthUser,
    server_id: Uuid,
) -> Result<ChatServer, ApiError> {
    chat.find_server(user.tenant_id, server_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("server {}", server_id)))
}

/// Membership check; returns the member's permission bits.
pub(crate) async fn require_member(
    chat: &ChatRepository,
    server_id: Uuid,
    user_id: Uuid,
) -> Result<i64, ApiError> {
    chat.member_permissions(server_id, user_id)
        .await?
        .ok_or_else(|| ApiError::Forbidden("not a member of this server".to_string()))
}

pub(crate) async fn require_permission(
    chat: &ChatRepository,
    server_id: Uuid,
    user_id: Uuid,
    bit: i64,
) -> Result<(), ApiError> {
    let permissions = require_member(chat, server_id, user_id).await?;
    if !perm::has(permissions, bit) {
        return Err(ApiError::Forbidden("missing permission".to_string()));
    }
    Ok(())
}
