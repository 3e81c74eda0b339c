//! Booking side of the booking-payment saga.
//!
//! The booking service owns the inventory ledger (ticket categories and their
//! remaining quota) and the booking aggregate. A booking is created `Pending`
//! while its quantity is taken from the ledger in the same transaction, then
//! moves exactly once to `Confirmed` or `Cancelled`:
//!
//! 1. `payment.success` from the payment service confirms it
//! 2. `payment.failed` / `payment.expired`, a manual cancel or the expiry
//!    sweeper cancels it and returns its quantity to the ledger
//!
//! Cancellations not caused by the payment service are announced to it with
//! `booking.cancelled` / `booking.expired`.

pub mod aggregate;
pub mod catalog;
pub mod coordinator;
pub mod error;
pub mod ledger;
pub mod seed;
pub mod state;
pub mod store;
pub mod sweeper;

pub use aggregate::{Booking, HOLD_MINUTES, Transition};
pub use catalog::{Event, InventoryItem};
pub use coordinator::{BookingCoordinator, CreateBooking, ExpiryReport};
pub use error::{BookingError, Result};
pub use seed::seed_demo_catalog;
pub use state::BookingStatus;
pub use store::{
    BookingFilter, BookingStore, BookingTx, InMemoryBookingStore, PostgresBookingStore,
};
pub use sweeper::ExpirySweeper;
