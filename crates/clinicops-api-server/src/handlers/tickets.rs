use crate::auth::AuthUser;
use crate::database::models::{Ticket, TicketMessage};
use crate::database::repositories::{TicketRepository, UserRepository};
use crate::utils::error::ApiError;
use axum::{
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

const STATUSES: [&str; 3] = ["open", "pending", "closed"];

// Widget (anonymous) endpoints

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTicketRequest {
    #[validate(length(min = 1, max = 300))]
    pub subject: String,
    #[validate(length(min = 1))]
    pub body: String,
    #[validate(length(min = 1, max = 200))]
    pub visitor_name: String,
    #[validate(email)]
    pub visitor_email: String,
    pub tenant_slug: String,
}

/// The widget stores `visitor_key` and presents it on follow-up requests.
#[derive(Debug, Serialize)]
pub struct CreateTicketResponse {
    pub ticket_id: Uuid,
    pub visitor_key: Uuid,
}

pub async fn create_public(
    Extension(tickets): Extension<Arc<TicketRepository>>,
    Extension(users): Extension<Arc<UserRepository>>,
    Json(payload): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<CreateTicketResponse>), ApiError> {
    payload.validate()?;

    let tenant = users
        .tenant_by_slug(&payload.tenant_slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("tenant".to_string()))?;

    let ticket = tickets
        .create(
            tenant.id,
            &payload.subject,
            &payload.body,
            &payload.visitor_name,
            &payload.visitor_email,
        )
        .await?;

    info!("Ticket {} opened for tenant {}", ticket.id, tenant.id);
    Ok((
        StatusCode::CREATED,
        Json(CreateTicketResponse {
            ticket_id: ticket.id,
            visitor_key: ticket.visitor_key,
        }),
    ))
}

fn visitor_key_from(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    headers
        .get("x-visitor-key")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| ApiError::Unauthorized("missing or malformed X-Visitor-Key".to_string()))
}

async fn ticket_for_visitor(
    tickets: &TicketRepository,
    id: Uuid,
    headers: &HeaderMap,
) -> Result<Ticket, ApiError> {
    let key = visitor_key_from(headers)?;
    let ticket = tickets
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("ticket".to_string()))?;

    if ticket.visitor_key != key {
        return Err(ApiError::Forbidden("wrong visitor key".to_string()));
    }

    Ok(ticket)
}

pub async fn list_messages_public(
    Extension(tickets): Extension<Arc<TicketRepository>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Vec<TicketMessage>>, ApiError> {
    let ticket = ticket_for_visitor(&tickets, id, &headers).await?;
    Ok(Json(tickets.list_messages(ticket.id).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct MessagePayload {
    #[validate(length(min = 1))]
    pub body: String,
}

pub async fn add_message_public(
    Extension(tickets): Extension<Arc<TicketRepository>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<MessagePayload>,
) -> Result<(StatusCode, Json<TicketMessage>), ApiError> {
    payload.validate()?;
    let ticket = ticket_for_visitor(&tickets, id, &headers).await?;

    if ticket.status == "closed" {
        return Err(ApiError::BadRequest("ticket is closed".to_string()));
    }

    let message = tickets
        .add_message(ticket.id, "visitor", None, &payload.body)
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

// Staff endpoints

#[derive(Debug, Deserialize)]
pub struct TicketListQuery {
    pub status: Option<String>,
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    Extension(tickets): Extension<Arc<TicketRepository>>,
    Query(query): Query<TicketListQuery>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    if let Some(status) = &query.status {
        if !STATUSES.contains(&status.as_str()) {
            return Err(ApiError::Validation(format!(
                "status must be one of {:?}",
                STATUSES
            )));
        }
    }

    Ok(Json(
        tickets.list(user.tenant_id, query.status.as_deref()).await?,
    ))
}

async fn ticket_for_staff(
    tickets: &TicketRepository,
    user: &AuthUser,
    id: Uuid,
) -> Result<Ticket, ApiError> {
    let ticket = tickets
        .find_by_id(id)
        .await?
        .filter(|t| t.tenant_id == user.tenant_id)
        .ok_or_else(|| ApiError::NotFound(format!("ticket {}", id)))?;

    Ok(ticket)
}

pub async fn list_messages(
    Extension(user): Extension<AuthUser>,
    Extension(tickets): Extension<Arc<TicketRepository>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TicketMessage>>, ApiError> {
    let ticket = ticket_for_staff(&tickets, &user, id).await?;
    Ok(Json(tickets.list_messages(ticket.id).await?))
}

pub async fn add_message(
    Extension(user): Extension<AuthUser>,
    Extension(tickets): Extension<Arc<TicketRepository>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MessagePayload>,
) -> Result<(StatusCode, Json<TicketMessage>), ApiError> {
    payload.validate()?;
    let ticket = ticket_for_staff(&tickets, &user, id).await?;

    let message = tickets
        .add_message(ticket.id, "staff", Some(user.user_id), &payload.body)
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

pub async fn set_status(
    Extension(user): Extension<AuthUser>,
    Extension(tickets): Extension<Arc<TicketRepository>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetStatusRequest>,
) -> Result<Json<Ticket>, ApiError> {
    if !STATUSES.contains(&payload.status.as_str()) {
        return Err(ApiError::Validation(format!(
            "status must be one of {:?}",
            STATUSES
        )));
    }

    ticket_for_staff(&tickets, &user, id).await?;

    let ticket = tickets
        .set_status(user.tenant_id, id, &payload.status)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("ticket {}", id)))?;

    Ok(Json(ticket))
}
