use super::{require_permission, server_in_tenant};
use crate::auth::AuthUser;
use crate::database::models::{perm, ChatMember, ChatRole};
use crate::database::repositories::ChatRepository;
use crate::utils::error::ApiError;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RolePayload {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub permissions: i64,
}

fn check_permission_bits(permissions: i64) -> Result<(), ApiError> {
    if permissions & !perm::ALL != 0 {
        return Err(ApiError::Validation("unknown permission bits".to_string()));
    }
    Ok(())
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    Extension(chat): Extension<Arc<ChatRepository>>,
    Path(server_id): Path<Uuid>,
) -> Result<Json<Vec<ChatRole>>, ApiError> {
    let server = server_in_tenant(&chat, &user, server_id).await?;
    super::require_member(&chat, server.id, user.user_id).await?;

    Ok(Json(chat.list_roles(server.id).await?))
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    Extension(chat): Extension<Arc<ChatRepository>>,
    Path(server_id): Path<Uuid>,
    Json(payload): Json<RolePayload>,
) -> Result<(StatusCode, Json<ChatRole>), ApiError> {
    payload.validate()?;
    check_permission_bits(payload.permissions)?;

    let server = server_in_tenant(&chat, &user, server_id).await?;
    require_permission(&chat, server.id, user.user_id, perm::MANAGE_ROLES).await?;

    let role = chat
        .create_role(server.id, &payload.name, payload.permissions)
        .await?;

    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    Extension(chat): Extension<Arc<ChatRepository>>,
    Path((server_id, role_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<RolePayload>,
) -> Result<Json<ChatRole>, ApiError> {
    payload.validate()?;
    check_permission_bits(payload.permissions)?;

    let server = server_in_tenant(&chat, &user, server_id).await?;
    require_permission(&chat, server.id, user.user_id, perm::MANAGE_ROLES).await?;

    let existing = chat
        .find_role(server.id, role_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("role {}", role_id)))?;
    if existing.built_in {
        return Err(ApiError::BadRequest("built-in roles cannot be edited".to_string()));
    }

    let role = chat
        .update_role(server.id, role_id, &payload.name, payload.permissions)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("role {}", role_id)))?;

    Ok(Json(role))
}

pub async fn delete(
    Extension(user): Extension<AuthUser>,
    Extension(chat): Extension<Arc<ChatRepository>>,
    Path((server_id, role_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let server = server_in_tenant(&chat, &user, server_id).await?;
    require_permission(&chat, server.id, user.user_id, perm::MANAGE_ROLES).await?;

    let existing = chat
        .find_role(server.id, role_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("role {}", role_id)))?;
    if existing.built_in {
        return Err(ApiError::BadRequest("built-in roles cannot be deleted".to_string()));
    }

    // Members holding the role fall back to the default member role
    let fallback = chat
        .role_by_name(server.id, "member")
        .await?
        .ok_or_else(|| ApiError::Internal("default member role missing".to_string()))?;

    let deleted = chat.delete_role(server.id, role_id, fallback.id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("role {}", role_id)));
    }

    info!("Role {} deleted from server {}", role_id, server.id);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role_id: Uuid,
}

pub async fn assign(
    Extension(user): Extension<AuthUser>,
    Extension(chat): Extension<Arc<ChatRepository>>,
    Path((server_id, member_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AssignRoleRequest>,
) -> Result<Json<ChatMember>, ApiError> {
    let server = server_in_tenant(&chat, &user, server_id).await?;
    require_permission(&chat, server.id, user.user_id, perm::MANAGE_ROLES).await?;

    chat.find_role(server.id, payload.role_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("unknown role".to_string()))?;

    let member = chat
        .assign_role(server.id, member_id, payload.role_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("member".to_string()))?;

    Ok(Json(member))
}
