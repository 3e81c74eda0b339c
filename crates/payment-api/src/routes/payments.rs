//! Payment creation, lookup and administrative status endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{BookingId, Money, PaymentId};
use payment::{CreatePayment, Payment, PaymentMethod, PaymentStatus, PaymentStore};
use serde::Deserialize;

use super::{json_body, parse_id};
use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    #[serde(default)]
    pub booking_id: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub payment_method: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
}

// -- Handlers --

/// POST /payments: open a pending payment for a booking.
#[tracing::instrument(skip(state, body))]
pub async fn create<S: PaymentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    let req = json_body(body)?;
    if req.booking_id.is_empty()
        || !req.amount.is_finite()
        || req.amount <= 0.0
        || req.payment_method.is_empty()
    {
        return Err(ApiError::BadRequest(
            "booking_id, amount, and payment_method are required and must be valid".to_string(),
        ));
    }
    let booking_id: BookingId = parse_id("booking ID", &req.booking_id)?;
    let method: PaymentMethod = req.payment_method.parse().map_err(ApiError::BadRequest)?;

    let payment = state
        .coordinator
        .create_payment(CreatePayment::new(
            booking_id,
            Money::from_decimal(req.amount),
            method,
        ))
        .await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

/// GET /payments: all payments, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: PaymentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    Ok(Json(state.coordinator.list_payments().await?))
}

/// GET /payments/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: PaymentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Payment>, ApiError> {
    let payment_id: PaymentId = parse_id("payment ID", &id)?;
    Ok(Json(state.coordinator.get_payment(payment_id).await?))
}

/// PUT /payments/{id}/status: administrative override. Accepts any known
/// status regardless of the current one and does not notify the booking
/// service.
#[tracing::instrument(skip(state, body))]
pub async fn update_status<S: PaymentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Payment>, ApiError> {
    let payment_id: PaymentId = parse_id("payment ID", &id)?;
    let req = json_body(body)?;
    if req.status.is_empty() {
        return Err(ApiError::BadRequest("status is required".to_string()));
    }
    let status: PaymentStatus = req.status.parse().map_err(ApiError::BadRequest)?;

    Ok(Json(
        state
            .coordinator
            .update_payment_status(payment_id, status)
            .await?,
    ))
}
