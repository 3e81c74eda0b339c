//! Webhook message schema.

use common::{BookingId, PaymentId};
use serde::{Deserialize, Serialize};

/// Payment outcome events delivered to the booking service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentEvent {
    /// The payment was settled; the booking should be confirmed.
    #[serde(rename = "payment.success")]
    Success,

    /// The payment was declined; the booking should be cancelled.
    #[serde(rename = "payment.failed")]
    Failed,

    /// The payment window lapsed; the booking should be cancelled.
    #[serde(rename = "payment.expired")]
    Expired,
}

impl PaymentEvent {
    /// Returns the wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentEvent::Success => "payment.success",
            PaymentEvent::Failed => "payment.failed",
            PaymentEvent::Expired => "payment.expired",
        }
    }
}

impl std::fmt::Display for PaymentEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "payment.success" => Ok(PaymentEvent::Success),
            "payment.failed" => Ok(PaymentEvent::Failed),
            "payment.expired" => Ok(PaymentEvent::Expired),
            other => Err(other.to_string()),
        }
    }
}

/// Booking lifecycle events delivered to the payment service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingEvent {
    /// The booking's hold lapsed before it was paid.
    #[serde(rename = "booking.expired")]
    Expired,

    /// The booking was cancelled directly.
    #[serde(rename = "booking.cancelled")]
    Cancelled,
}

impl BookingEvent {
    /// Returns the wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingEvent::Expired => "booking.expired",
            BookingEvent::Cancelled => "booking.cancelled",
        }
    }
}

impl std::fmt::Display for BookingEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "booking.expired" => Ok(BookingEvent::Expired),
            "booking.cancelled" => Ok(BookingEvent::Cancelled),
            other => Err(other.to_string()),
        }
    }
}

/// Payment service → booking service (`POST /bookings/webhook/payment`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentNotification {
    pub event: PaymentEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<PaymentId>,
    pub booking_id: BookingId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl PaymentNotification {
    /// Builds the notification for a payment that reached `status`.
    pub fn new(
        event: PaymentEvent,
        payment_id: PaymentId,
        booking_id: BookingId,
        status: impl Into<String>,
    ) -> Self {
        Self {
            event,
            payment_id: Some(payment_id),
            booking_id,
            status: Some(status.into()),
        }
    }
}

/// Booking service → payment service (`POST /payments/webhook/booking`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingNotification {
    pub event: BookingEvent,
    pub booking_id: BookingId,
    pub status: String,
}

impl BookingNotification {
    pub fn new(event: BookingEvent, booking_id: BookingId, status: impl Into<String>) -> Self {
        Self {
            event,
            booking_id,
            status: status.into(),
        }
    }
}
