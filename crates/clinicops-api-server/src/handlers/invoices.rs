use crate::auth::AuthUser;
use crate::database::models::{Invoice, LineItem};
use crate::database::repositories::{InvoiceRepository, PatientRepository};
use crate::utils::error::ApiError;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Legal status moves: draft→sent, draft→void, sent→paid, sent→void.
pub fn can_transition(from: &str, to: &str) -> bool {
    matches!(
        (from, to),
        ("draft", "sent") | ("draft", "void") | ("sent", "paid") | ("sent", "void")
    )
}

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub patient_id: Uuid,
    pub line_items: Vec<LineItem>,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

fn total_of(items: &[LineItem]) -> Result<i64, ApiError> {
    if items.is_empty() {
        return Err(ApiError::Validation(
            "invoice needs at least one line item".to_string(),
        ));
    }

    let mut total: i64 = 0;
    for item in items {
        if item.quantity < 1 {
            return Err(ApiError::Validation("quantity must be >= 1".to_string()));
        }
        if item.unit_price_cents < 0 {
            return Err(ApiError::Validation(
                "unit_price_cents must be >= 0".to_string(),
            ));
        }
        total = item
            .quantity
            .checked_mul(item.unit_price_cents)
            .and_then(|line| total.checked_add(line))
            .ok_or_else(|| ApiError::Validation("line item total too large".to_string()))?;
    }

    Ok(total)
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    Extension(invoices): Extension<Arc<InvoiceRepository>>,
    Extension(patients): Extension<Arc<PatientRepository>>,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<Invoice>), ApiError> {
    let total_cents = total_of(&payload.line_items)?;

    patients
        .find_by_id(user.tenant_id, payload.patient_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("unknown patient".to_string()))?;

    let line_items = serde_json::to_value(&payload.line_items)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let invoice = invoices
        .create(user.tenant_id, payload.patient_id, total_cents, line_items)
        .await?;

    info!(
        "Invoice #{} created in tenant {} ({} cents)",
        invoice.number, user.tenant_id, invoice.total_cents
    );
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    Extension(invoices): Extension<Arc<InvoiceRepository>>,
    Query(query): Query<InvoiceListQuery>,
) -> Result<Json<Vec<Invoice>>, ApiError> {
    Ok(Json(
        invoices.list(user.tenant_id, query.status.as_deref()).await?,
    ))
}

pub async fn get(
    Extension(user): Extension<AuthUser>,
    Extension(invoices): Extension<Arc<InvoiceRepository>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, ApiError> {
    let invoice = invoices
        .find_by_id(user.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("invoice {}", id)))?;

    Ok(Json(invoice))
}

pub async fn set_status(
    Extension(user): Extension<AuthUser>,
    Extension(invoices): Extension<Arc<InvoiceRepository>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetStatusRequest>,
) -> Result<Json<Invoice>, ApiError> {
    let invoice = invoices
        .find_by_id(user.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("invoice {}", id)))?;

    if !can_transition(&invoice.status, &payload.status) {
        return Err(ApiError::BadRequest(format!(
            "cannot move invoice from '{}' to '{}'",
            invoice.status, payload.status
        )));
    }

    let mark_paid = payload.status == "paid";
    let invoice = invoices
        .set_status(user.tenant_id, id, &payload.status, &invoice.status, mark_paid)
        .await?
        .ok_or_else(|| {
            // A concurrent request moved the invoice first
            ApiError::Conflict(format!("invoice is no longer '{}'", invoice.status))
        })?;

    Ok(Json(invoice))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        assert!(can_transition("draft", "sent"));
        assert!(can_transition("draft", "void"));
        assert!(can_transition("sent", "paid"));
        assert!(can_transition("sent", "void"));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!can_transition("paid", "draft"));
        assert!(!can_transition("void", "sent"));
        assert!(!can_transition("draft", "paid"));
        assert!(!can_transition("sent", "draft"));
        assert!(!can_transition("draft", "draft"));
    }

    #[test]
    fn test_paid_and_void_are_terminal() {
        for to in ["draft", "sent", "paid", "void"] {
            assert!(!can_transition("paid", to));
            assert!(!can_transition("void", to));
        }
    }

    #[test]
    fn test_total_sums_line_items() {
        let items = vec![
            LineItem {
                description: "Consultation".to_string(),
                quantity: 2,
                unit_price_cents: 5000,
            },
            LineItem {
                description: "X-ray".to_string(),
                quantity: 1,
                unit_price_cents: 12000,
            },
        ];
        assert_eq!(total_of(&items).unwrap(), 22000);
    }

    #[test]
    fn test_empty_or_invalid_items_rejected() {
        assert!(total_of(&[]).is_err());

        let items = vec![LineItem {
            description: "x".to_string(),
            quantity: 0,
            unit_price_cents: 100,
        }];
        assert!(total_of(&items).is_err());
    }

    #[test]
    fn test_overflowing_total_rejected() {
        let items = vec![LineItem {
            description: "x".to_string(),
            quantity: i64::MAX,
            unit_price_cents: 2,
        }];
        assert!(matches!(total_of(&items), Err(ApiError::Validation(_))));

        // Sum overflow across items, not just a single line
        let items = vec![
            LineItem {
                description: "a".to_string(),
                quantity: 1,
                unit_price_cents: i64::MAX,
            },
            LineItem {
                description: "b".to_string(),
                quantity: 1,
                unit_price_cents: 1,
            },
        ];
        assert!(matches!(total_of(&items), Err(ApiError::Validation(_))));
    }
}
