//! Read-through access to bookings owned by the booking service.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{BookingId, EventId, Money, TicketId, UserId};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{PaymentError, Result};

/// The payment service's view of a booking, as returned by `GET /bookings/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSnapshot {
    pub id: BookingId,
    pub user_id: UserId,
    pub event_id: EventId,
    pub ticket_id: TicketId,
    pub quantity: u32,
    pub total_amount: Money,
    pub status: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Looks up bookings in the booking service.
#[async_trait]
pub trait BookingDirectory: Send + Sync {
    /// Fetches a booking. Fails with `BookingNotFound` when the booking is
    /// absent or the booking service cannot be reached.
    async fn get_booking(&self, booking_id: BookingId) -> Result<BookingSnapshot>;
}

#[async_trait]
impl<D: BookingDirectory + ?Sized> BookingDirectory for Arc<D> {
    async fn get_booking(&self, booking_id: BookingId) -> Result<BookingSnapshot> {
        (**self).get_booking(booking_id).await
    }
}

/// Fetches bookings over HTTP from the booking service.
#[derive(Debug, Clone)]
pub struct HttpBookingDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBookingDirectory {
    /// Creates a directory for the booking service at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PaymentError::InvalidInput(format!("http client: {e}")))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BookingDirectory for HttpBookingDirectory {
    #[tracing::instrument(skip(self))]
    async fn get_booking(&self, booking_id: BookingId) -> Result<BookingSnapshot> {
        let not_found = |reason: String| PaymentError::BookingNotFound { booking_id, reason };
        let url = format!("{}/bookings/{}", self.base_url, booking_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| not_found(format!("booking service unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(not_found(format!(
                "booking service returned status {}: {body}",
                status.as_u16()
            )));
        }

        response
            .json::<BookingSnapshot>()
            .await
            .map_err(|e| not_found(format!("unreadable booking response: {e}")))
    }
}

/// In-memory booking directory for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingDirectory {
    bookings: Arc<RwLock<HashMap<BookingId, BookingSnapshot>>>,
}

impl InMemoryBookingDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a booking.
    pub async fn insert(&self, booking: BookingSnapshot) {
        self.bookings.write().await.insert(booking.id, booking);
    }
}

#[async_trait]
impl BookingDirectory for InMemoryBookingDirectory {
    async fn get_booking(&self, booking_id: BookingId) -> Result<BookingSnapshot> {
        self.bookings
            .read()
            .await
            .get(&booking_id)
            .cloned()
            .ok_or_else(|| PaymentError::BookingNotFound {
                booking_id,
                reason: "no such booking".to_string(),
            })
    }
}
