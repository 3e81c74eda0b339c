//! Storage for events, ticket categories and bookings.
//!
//! All mutation goes through a [`BookingTx`]. A transaction locks the rows it
//! touches (`SELECT ... FOR UPDATE` in Postgres, a per-row mutex in memory)
//! and holds those locks until it is committed or dropped. Dropping a
//! transaction without committing rolls it back.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{BookingId, EventId, TicketId, UserId};

use crate::aggregate::Booking;
use crate::catalog::{Event, InventoryItem};
use crate::error::Result;
use crate::state::BookingStatus;

pub use memory::{InMemoryBookingStore, InMemoryTx};
pub use postgres::{PostgresBookingStore, PostgresTx};

/// Filter for booking listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingFilter {
    pub user_id: Option<UserId>,
}

impl BookingFilter {
    /// Lists every booking.
    pub fn all() -> Self {
        Self::default()
    }

    /// Lists the bookings of one user.
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }
}

/// A unit of work over the booking tables.
#[async_trait]
pub trait BookingTx: Send + Sized {
    /// Locks and loads a ticket category. Blocks while another transaction
    /// holds the same row. Locking a row twice in one transaction is a no-op.
    async fn lock_ticket(&mut self, id: TicketId) -> Result<Option<InventoryItem>>;

    /// Adds `delta` to a locked ticket's quota and returns the updated row.
    async fn adjust_quota(&mut self, id: TicketId, delta: i64) -> Result<InventoryItem>;

    /// Locks and loads a booking.
    async fn lock_booking(&mut self, id: BookingId) -> Result<Option<Booking>>;

    /// Inserts a new booking row.
    async fn insert_booking(&mut self, booking: &Booking) -> Result<()>;

    /// Overwrites the status of a locked booking.
    async fn set_booking_status(&mut self, id: BookingId, status: BookingStatus) -> Result<()>;

    /// Makes every change in this transaction visible atomically.
    async fn commit(self) -> Result<()>;
}

/// Read access and transaction factory for the booking service's data.
#[async_trait]
pub trait BookingStore: Send + Sync {
    type Tx: BookingTx;

    /// Opens a new transaction.
    async fn begin(&self) -> Result<Self::Tx>;

    async fn get_event(&self, id: EventId) -> Result<Option<Event>>;

    async fn list_events(&self) -> Result<Vec<Event>>;

    async fn get_ticket(&self, id: TicketId) -> Result<Option<InventoryItem>>;

    async fn list_tickets_for_event(&self, event_id: EventId) -> Result<Vec<InventoryItem>>;

    async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>>;

    /// Lists bookings, newest first.
    async fn list_bookings(&self, filter: BookingFilter) -> Result<Vec<Booking>>;

    /// Returns pending bookings whose hold lapsed at or before `now`.
    async fn find_overdue(&self, now: DateTime<Utc>) -> Result<Vec<BookingId>>;

    /// Inserts an event. Used for seeding; events are otherwise read-only here.
    async fn insert_event(&self, event: &Event) -> Result<()>;

    /// Inserts a ticket category with its initial quota.
    async fn insert_ticket(&self, item: &InventoryItem) -> Result<()>;
}
