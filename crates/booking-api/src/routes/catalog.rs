//! Read-only views of events and their ticket categories.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use booking::{BookingStore, Event, InventoryItem};

use super::parse_id;
use crate::AppState;
use crate::error::ApiError;

/// GET /events
#[tracing::instrument(skip(state))]
pub async fn list_events<S: BookingStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Event>>, ApiError> {
    Ok(Json(state.coordinator.list_events().await?))
}

/// GET /events/{id}
#[tracing::instrument(skip(state))]
pub async fn get_event<S: BookingStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    let event_id = parse_id("event ID", &id)?;
    Ok(Json(state.coordinator.get_event(event_id).await?))
}

/// GET /events/{id}/tickets: the event's categories with their remaining quota.
#[tracing::instrument(skip(state))]
pub async fn list_tickets<S: BookingStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    let event_id = parse_id("event ID", &id)?;
    Ok(Json(state.coordinator.list_tickets(event_id).await?))
}

/// GET /tickets/{id}
#[tracing::instrument(skip(state))]
pub async fn get_ticket<S: BookingStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<InventoryItem>, ApiError> {
    let ticket_id = parse_id("ticket ID", &id)?;
    Ok(Json(state.coordinator.get_ticket(ticket_id).await?))
}
