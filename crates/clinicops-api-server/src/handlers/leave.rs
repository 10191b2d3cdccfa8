use crate::auth::AuthUser;
use crate::database::models::LeaveRequest;
use crate::database::repositories::LeaveRepository;
use crate::utils::error::ApiError;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Inclusive calendar days between the two dates.
pub fn day_count(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

#[derive(Debug, Deserialize)]
pub struct CreateLeaveRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LeaveListQuery {
    pub user_id: Option<Uuid>,
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    Extension(leave): Extension<Arc<LeaveRepository>>,
    Json(payload): Json<CreateLeaveRequest>,
) -> Result<(StatusCode, Json<LeaveRequest>), ApiError> {
    if payload.start_date > payload.end_date {
        return Err(ApiError::Validation(
            "start_date must not be after end_date".to_string(),
        ));
    }

    let days = day_count(payload.start_date, payload.end_date);
    if days > i32::MAX as i64 {
        return Err(ApiError::Validation("leave range too large".to_string()));
    }
    let days = days as i32;

    let balance = leave
        .balance_for(user.tenant_id, user.user_id)
        .await?
        .ok_or_else(|| ApiError::Internal("user row missing".to_string()))?;

    if !balance.can_cover(days) {
        return Err(ApiError::BadRequest(format!(
            "insufficient leave balance: requested {} days, {} remaining",
            days,
            balance.remaining().max(0)
        )));
    }

    let request = leave
        .create(
            user.tenant_id,
            user.user_id,
            payload.start_date,
            payload.end_date,
            days,
            payload.reason.as_deref(),
        )
        .await?;

    info!(
        "Leave request {} ({} days) created by {}",
        request.id, days, user.user_id
    );
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    Extension(leave): Extension<Arc<LeaveRepository>>,
    Query(query): Query<LeaveListQuery>,
) -> Result<Json<Vec<LeaveRequest>>, ApiError> {
    // Non-admins only see their own requests
    let target = match query.user_id {
        Some(other) if other != user.user_id => {
            if !user.is_admin() {
                return Err(ApiError::Forbidden(
                    "admin role required to view other users' leave".to_string(),
                ));
            }
            other
        }
        _ => user.user_id,
    };

    Ok(Json(leave.list_for_user(user.tenant_id, target).await?))
}

pub async fn approve(
    Extension(user): Extension<AuthUser>,
    Extension(leave): Extension<Arc<LeaveRepository>>,
    Path(id): Path<Uuid>,
) -> Result<Json<LeaveRequest>, ApiError> {
    if !user.is_admin() {
        return Err(ApiError::Forbidden("admin role required".to_string()));
    }

    // Distinguish "no such request" from "already decided"
    let existing = leave
        .find_by_id(user.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("leave request {}", id)))?;

    let request = leave
        .approve(user.tenant_id, id, user.user_id)
        .await?
        .ok_or_else(|| {
            ApiError::Conflict(format!("leave request already {}", existing.status))
        })?;

    info!(
        "Leave request {} approved, {} days charged to {}",
        request.id, request.day_count, request.user_id
    );
    Ok(Json(request))
}

pub async fn reject(
    Extension(user): Extension<AuthUser>,
    Extension(leave): Extension<Arc<LeaveRepository>>,
    Path(id): Path<Uuid>,
) -> Result<Json<LeaveRequest>, ApiError> {
    if !user.is_admin() {
        return Err(ApiError::Forbidden("admin role required".to_string()));
    }

    let existing = leave
        .find_by_id(user.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("leave request {}", id)))?;

    let request = leave
        .reject(user.tenant_id, id, user.user_id)
        .await?
        .ok_or_else(|| {
            ApiError::Conflict(format!("leave request already {}", existing.status))
        })?;

    Ok(Json(request))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_count_is_inclusive() {
        assert_eq!(day_count(date(2026, 3, 2), date(2026, 3, 2)), 1);
        assert_eq!(day_count(date(2026, 3, 2), date(2026, 3, 6)), 5);
    }

    #[test]
    fn test_day_count_spans_months() {
        assert_eq!(day_count(date(2026, 1, 30), date(2026, 2, 2)), 4);
    }
}
