//! Shared value types for the booking and payment services.
//!
//! The two services never share storage; what they share is the vocabulary
//! on the wire: UUID identifiers serialized as canonical text and monetary
//! amounts.

pub mod error_kind;
pub mod money;
pub mod types;

pub use error_kind::ErrorKind;
pub use money::Money;
pub use types::{BookingId, EventId, PaymentId, TicketId, UserId};
