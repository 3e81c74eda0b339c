//! Inbound webhooks: the payment gateway and the booking service.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use common::{BookingId, PaymentId};
use payment::{Payment, PaymentStatus, PaymentStore};
use serde::{Deserialize, Serialize};

use super::{json_body, parse_id};
use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct GatewayWebhookRequest {
    #[serde(default)]
    pub payment_id: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct BookingWebhookRequest {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub booking_id: String,
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct BookingWebhookResponse {
    pub booking_id: BookingId,
    /// The booking's payment after the event was applied, if it has one.
    pub payment: Option<Payment>,
}

/// POST /payments/webhook/payment-gateway: the gateway reports an outcome.
#[tracing::instrument(skip_all)]
pub async fn gateway<S: PaymentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<GatewayWebhookRequest>, JsonRejection>,
) -> Result<Json<Payment>, ApiError> {
    let req = json_body(body)?;
    if req.payment_id.is_empty() || req.status.is_empty() {
        return Err(ApiError::BadRequest(
            "payment_id and status are required".to_string(),
        ));
    }
    let payment_id: PaymentId = parse_id("payment ID", &req.payment_id)?;
    let status: PaymentStatus = req
        .status
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid status".to_string()))?;

    tracing::info!(%payment_id, %status, "gateway webhook received");

    Ok(Json(
        state
            .coordinator
            .handle_gateway_webhook(payment_id, status)
            .await?,
    ))
}

/// POST /payments/webhook/booking: `booking.expired` or `booking.cancelled`.
#[tracing::instrument(skip_all)]
pub async fn booking<S: PaymentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<BookingWebhookRequest>, JsonRejection>,
) -> Result<Json<BookingWebhookResponse>, ApiError> {
    let req = json_body(body)?;
    if req.booking_id.is_empty() || req.event.is_empty() {
        return Err(ApiError::BadRequest(
            "booking_id and event are required".to_string(),
        ));
    }
    let booking_id: BookingId = parse_id("booking ID", &req.booking_id)?;

    tracing::info!(
        event = %req.event,
        %booking_id,
        status = req.status.as_deref().unwrap_or(""),
        "booking webhook received"
    );

    let payment = state
        .coordinator
        .handle_booking_notification(&req.event, booking_id)
        .await?;

    Ok(Json(BookingWebhookResponse {
        booking_id,
        payment,
    }))
}
