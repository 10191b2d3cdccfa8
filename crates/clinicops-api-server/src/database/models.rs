use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub leave_allowance_days: i32,
    pub leave_used_days: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Patient {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Stage {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub position: i32,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Deal {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub patient_id: Option<Uuid>,
    pub stage_id: Uuid,
    pub value_cents: i64,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Workflow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub stage_id: Uuid,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkflowAction {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub position: i32,
    pub template_subject: String,
    pub template_body: String,
    pub delay_days: i32,
    pub repeat_count: i32,
}

/// Outbox row recorded for every workflow email occurrence.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OutboxEmail {
    pub id: i64,
    pub tenant_id: Uuid,
    pub deal_id: Uuid,
    pub action_id: Uuid,
    pub recipient: Option<String>,
    pub subject: String,
    pub body: String,
    pub send_at: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub deal_id: Option<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Invoice {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub number: i64,
    pub patient_id: Uuid,
    pub status: String,
    pub total_cents: i64,
    pub line_items: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LeaveRequest {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub day_count: i32,
    pub reason: Option<String>,
    pub status: String,
    pub decided_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// Dischat

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChatServer {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub invite_code: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChatChannel {
    pub id: Uuid,
    pub server_id: Option<Uuid>,
    pub name: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChatRole {
    pub id: Uuid,
    pub server_id: Uuid,
    pub name: String,
    pub permissions: i64,
    pub built_in: bool,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChatMember {
    pub server_id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChatMessageRow {
    pub id: i64,
    pub channel_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChatThread {
    pub id: Uuid,
    pub channel_id: Uuid,
    pub parent_channel_id: Uuid,
    pub title: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DmChannel {
    pub channel_id: Uuid,
    pub tenant_id: Uuid,
    pub user_a: Uuid,
    pub user_b: Uuid,
}

/// Role permission bits.
pub mod perm {
    pub const SEND_MESSAGES: i64 = 1 << 0;
    pub const MANAGE_CHANNELS: i64 = 1 << 1;
    pub const MANAGE_ROLES: i64 = 1 << 2;
    pub const MANAGE_SERVER: i64 = 1 << 3;

    pub const ALL: i64 = SEND_MESSAGES | MANAGE_CHANNELS | MANAGE_ROLES | MANAGE_SERVER;

    /// Default bits for the built-in `member` role.
    pub const MEMBER_DEFAULT: i64 = SEND_MESSAGES;

    pub fn has(permissions: i64, bit: i64) -> bool {
        permissions & bit == bit
    }
}

// Marketing reports

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Report {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub metrics: serde_json::Value,
    pub public_token: Option<Uuid>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

// Support tickets

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Ticket {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub subject: String,
    pub status: String,
    pub visitor_name: String,
    pub visitor_email: String,
    #[serde(skip_serializing)]
    pub visitor_key: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TicketMessage {
    pub id: i64,
    pub ticket_id: Uuid,
    pub author: String,
    pub author_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_bits() {
        assert!(perm::has(perm::ALL, perm::MANAGE_ROLES));
        assert!(perm::has(perm::MEMBER_DEFAULT, perm::SEND_MESSAGES));
        assert!(!perm::has(perm::MEMBER_DEFAULT, perm::MANAGE_CHANNELS));
        assert!(!perm::has(0, perm::SEND_MESSAGES));
    }
}
