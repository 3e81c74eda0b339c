//! Booking state machine.

use serde::{Deserialize, Serialize};

/// The status of a booking in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Confirmed
///           └──► Cancelled
/// ```
///
/// `Paid` is a legacy label still accepted on the status endpoint. No
/// transition produces it and it is never a valid target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Inventory is held, awaiting the payment outcome.
    #[default]
    Pending,

    /// Payment succeeded; inventory stays consumed (terminal state).
    Confirmed,

    /// Payment failed, expired or the booking was cancelled; inventory
    /// has been released (terminal state).
    Cancelled,

    /// Legacy label, accepted on input only.
    Paid,
}

impl BookingStatus {
    /// Returns true if the booking may still transition.
    pub fn is_pending(&self) -> bool {
        matches!(self, BookingStatus::Pending)
    }

    /// Returns true if the booking's quantity counts against the ledger.
    pub fn holds_inventory(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// Returns true if `target` is reachable from this status.
    pub fn can_transition_to(&self, target: BookingStatus) -> bool {
        matches!(
            (self, target),
            (
                BookingStatus::Pending,
                BookingStatus::Confirmed | BookingStatus::Cancelled
            )
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Cancelled)
    }

    /// Returns the status name as stored and sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Paid => "PAID",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            "PAID" => Ok(BookingStatus::Paid),
            other => Err(format!("invalid booking status: {other}")),
        }
    }
}
