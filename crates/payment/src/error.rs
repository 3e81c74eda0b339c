//! Payment error types.

use common::{BookingId, ErrorKind, PaymentId};
use messaging::PublishError;
use thiserror::Error;

use crate::state::PaymentStatus;

/// Errors that can occur in the payment service.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Malformed request data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The payment does not exist.
    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    /// The referenced booking is absent or the booking service could not be reached.
    #[error("Booking not found: {booking_id} ({reason})")]
    BookingNotFound {
        booking_id: BookingId,
        reason: String,
    },

    /// The booking already has a payment.
    #[error("Payment already exists for booking {0}")]
    AlreadyExists(BookingId),

    /// The payment already left `Pending`.
    #[error("Payment {payment_id} is not pending (status {status})")]
    NotPending {
        payment_id: PaymentId,
        status: PaymentStatus,
    },

    /// A webhook carried an event name this service does not handle.
    #[error("Unknown event type: {0}")]
    UnknownEvent(String),

    /// The status change was saved but the booking service was not told.
    #[error("Failed to notify booking service: {0}")]
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

impl PaymentError {
    /// Classifies the error for transport layers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PaymentError::InvalidInput(_) | PaymentError::UnknownEvent(_) => {
                ErrorKind::InvalidInput
            }
            PaymentError::PaymentNotFound(_) | PaymentError::BookingNotFound { .. } => {
                ErrorKind::NotFound
            }
            PaymentError::AlreadyExists(_) | PaymentError::NotPending { .. } => {
                ErrorKind::Conflict
            }
            PaymentError::Notification(_) => ErrorKind::Upstream,
            PaymentError::CorruptRow(_)
            | PaymentError::Database(_)
            | PaymentError::Migration(_) => ErrorKind::Internal,
        }
    }
}

/// Convenience type alias for payment results.
pub type Result<T> = std::result::Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let id = BookingId::new();
        assert_eq!(PaymentError::AlreadyExists(id).kind(), ErrorKind::Conflict);
        assert_eq!(
            PaymentError::BookingNotFound {
                booking_id: id,
                reason: "connection refused".to_string()
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            PaymentError::Notification(PublishError::Rejected("down".to_string())).kind(),
            ErrorKind::Upstream
        );
    }
}
