//! Booking error types.

use common::{BookingId, ErrorKind, EventId, TicketId};
use messaging::PublishError;
use thiserror::Error;

use crate::state::BookingStatus;

/// Errors that can occur in the booking service.
#[derive(Debug, Error)]
pub enum BookingError {
    /// Malformed request data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The event does not exist.
    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    /// The ticket category does not exist.
    #[error("Ticket not found: {0}")]
    TicketNotFound(TicketId),

    /// The booking does not exist.
    #[error("Booking not found: {0}")]
    BookingNotFound(BookingId),

    /// The ticket category belongs to a different event.
    #[error("Ticket {ticket_id} does not belong to event {event_id}")]
    TicketEventMismatch {
        ticket_id: TicketId,
        event_id: EventId,
    },

    /// Not enough quota left on the ticket category.
    #[error("Insufficient ticket quota: requested {requested}, available {available}")]
    InsufficientQuota { requested: u32, available: u32 },

    /// The booking already left `Pending`.
    #[error("Booking {booking_id} is not pending (status {status})")]
    NotPending {
        booking_id: BookingId,
        status: BookingStatus,
    },

    /// A webhook carried an event name this service does not handle.
    #[error("Unknown event type: {0}")]
    UnknownEvent(String),

    /// Delivering a notification to the payment service failed.
    #[error("Notification failed: {0}")]
    Notification(#[from] PublishError),

    /// A stored row could not be mapped back into the domain.
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl BookingError {
    /// Classifies the error for transport layers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::InvalidInput(_) | BookingError::UnknownEvent(_) => {
                ErrorKind::InvalidInput
            }
            BookingError::EventNotFound(_)
            | BookingError::TicketNotFound(_)
            | BookingError::BookingNotFound(_) => ErrorKind::NotFound,
            BookingError::TicketEventMismatch { .. }
            | BookingError::InsufficientQuota { .. }
            | BookingError::NotPending { .. } => ErrorKind::Conflict,
            BookingError::Notification(_) => ErrorKind::Upstream,
            BookingError::CorruptRow(_)
            | BookingError::Database(_)
            | BookingError::Migration(_) => ErrorKind::Internal,
        }
    }

    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            BookingError::InvalidInput(_) => "invalid_input",
            BookingError::EventNotFound(_) => "event_not_found",
            BookingError::TicketNotFound(_) => "ticket_not_found",
            BookingError::BookingNotFound(_) => "booking_not_found",
            BookingError::TicketEventMismatch { .. } => "ticket_event_mismatch",
            BookingError::InsufficientQuota { .. } => "insufficient_quota",
            BookingError::NotPending { .. } => "not_pending",
            BookingError::UnknownEvent(_) => "unknown_event",
            BookingError::Notification(_) => "notification",
            BookingError::CorruptRow(_) => "corrupt_row",
            BookingError::Database(_) => "database",
            BookingError::Migration(_) => "migration",
        }
    }
}

/// Convenience type alias for booking results.
pub type Result<T> = std::result::Result<T, BookingError>;
