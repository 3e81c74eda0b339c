//! Booking creation, lookup and status endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use booking::{Booking, BookingFilter, BookingStatus, BookingStore, CreateBooking};
use common::{BookingId, EventId, TicketId, UserId};
use serde::Deserialize;

use super::parse_id;
use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub ticket_id: String,
    #[serde(default)]
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
}

// -- Handlers --

/// POST /bookings: reserve tickets for the authenticated caller.
#[tracing::instrument(skip_all)]
pub async fn create<S: BookingStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    body: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Authorization token is required".to_string()))?;
    let user_id: UserId = state.identity.authenticate(authorization).await?;

    let Json(req) = body.map_err(|_| ApiError::BadRequest("Invalid request body".to_string()))?;
    if req.event_id.is_empty() || req.ticket_id.is_empty() || req.quantity <= 0 {
        return Err(ApiError::BadRequest(
            "All fields are required and must be valid".to_string(),
        ));
    }
    let quantity = u32::try_from(req.quantity)
        .map_err(|_| ApiError::BadRequest("quantity is too large".to_string()))?;
    let event_id: EventId = parse_id("event ID", &req.event_id)?;
    let ticket_id: TicketId = parse_id("ticket ID", &req.ticket_id)?;

    let booking = state
        .coordinator
        .create_booking(CreateBooking::new(user_id, event_id, ticket_id, quantity))
        .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /bookings: all bookings, newest first, optionally for one user.
#[tracing::instrument(skip(state))]
pub async fn list<S: BookingStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let filter = match query.user_id.as_deref().filter(|id| !id.is_empty()) {
        Some(raw) => BookingFilter::for_user(parse_id("user ID", raw)?),
        None => BookingFilter::all(),
    };

    Ok(Json(state.coordinator.list_bookings(filter).await?))
}

/// GET /bookings/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: BookingStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, ApiError> {
    let booking_id: BookingId = parse_id("booking ID", &id)?;
    Ok(Json(state.coordinator.get_booking(booking_id).await?))
}

/// PUT /bookings/{id}/status: client-requested transition out of `PENDING`.
#[tracing::instrument(skip(state, body))]
pub async fn update_status<S: BookingStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Booking>, ApiError> {
    let booking_id: BookingId = parse_id("booking ID", &id)?;
    let Json(req) = body.map_err(|_| ApiError::BadRequest("Invalid request body".to_string()))?;
    if req.status.is_empty() {
        return Err(ApiError::BadRequest("Status is required".to_string()));
    }
    let target: BookingStatus = req.status.parse().map_err(ApiError::BadRequest)?;

    let booking = state
        .coordinator
        .change_booking_status(booking_id, target)
        .await?;

    Ok(Json(booking))
}
