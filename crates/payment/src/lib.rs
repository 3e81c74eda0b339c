//! Payment side of the booking-payment saga.
//!
//! A payment is opened against an existing booking (at most one per booking)
//! and resolved once by the payment gateway. Each resolution is pushed to the
//! booking service as `payment.success` or `payment.failed`; in the other
//! direction, `booking.expired` / `booking.cancelled` expire a payment that is
//! still pending.

pub mod aggregate;
pub mod coordinator;
pub mod directory;
pub mod error;
pub mod state;
pub mod store;

pub use aggregate::{DEFAULT_CURRENCY, Payment};
pub use coordinator::{CreatePayment, PaymentCoordinator};
pub use directory::{
    BookingDirectory, BookingSnapshot, HttpBookingDirectory, InMemoryBookingDirectory,
};
pub use error::{PaymentError, Result};
pub use state::{PaymentMethod, PaymentStatus};
pub use store::{InMemoryPaymentStore, PaymentStore, PostgresPaymentStore};
