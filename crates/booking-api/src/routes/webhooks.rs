//! Inbound webhook from the payment service.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use booking::{Booking, BookingStore};
use common::BookingId;
use serde::Deserialize;

use super::parse_id;
use crate::AppState;
use crate::error::ApiError;

/// Body of `POST /bookings/webhook/payment`. Ids arrive as text so a
/// malformed one is reported as such rather than as an unreadable body.
#[derive(Debug, Deserialize)]
pub struct PaymentWebhookRequest {
    #[serde(default)]
    pub event: String,
    pub payment_id: Option<String>,
    #[serde(default)]
    pub booking_id: String,
    pub status: Option<String>,
}

/// POST /bookings/webhook/payment: applies `payment.success`,
/// `payment.failed` or `payment.expired` to the booking.
#[tracing::instrument(skip_all)]
pub async fn payment<S: BookingStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<PaymentWebhookRequest>, JsonRejection>,
) -> Result<Json<Booking>, ApiError> {
    let Json(req) = body.map_err(|_| ApiError::BadRequest("Invalid request body".to_string()))?;
    if req.booking_id.is_empty() || req.event.is_empty() {
        return Err(ApiError::BadRequest(
            "booking_id and event are required".to_string(),
        ));
    }
    let booking_id: BookingId = parse_id("booking ID", &req.booking_id)?;

    tracing::info!(
        event = %req.event,
        %booking_id,
        payment_id = req.payment_id.as_deref().unwrap_or(""),
        status = req.status.as_deref().unwrap_or(""),
        "payment webhook received"
    );

    let booking = state
        .coordinator
        .handle_payment_notification(&req.event, booking_id)
        .await?;

    Ok(Json(booking))
}
