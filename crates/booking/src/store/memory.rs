use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{BookingId, EventId, TicketId};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::aggregate::Booking;
use crate::catalog::{Event, InventoryItem};
use crate::error::{BookingError, Result};
use crate::state::BookingStatus;
use crate::store::{BookingFilter, BookingStore, BookingTx};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RowKey {
    Ticket(TicketId),
    Booking(BookingId),
}

type RowLocks = Arc<Mutex<HashMap<RowKey, Arc<Mutex<()>>>>>;

#[derive(Debug, Default)]
struct Tables {
    events: HashMap<EventId, Event>,
    tickets: HashMap<TicketId, InventoryItem>,
    bookings: HashMap<BookingId, Booking>,
}

/// In-memory booking store for testing and local runs.
///
/// Mirrors the Postgres locking discipline: each ticket and booking row has
/// its own mutex, so transactions on unrelated rows run concurrently while
/// transactions on the same row serialize.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingStore {
    tables: Arc<RwLock<Tables>>,
    row_locks: RowLocks,
}

impl InMemoryBookingStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of bookings stored.
    pub async fn booking_count(&self) -> usize {
        self.tables.read().await.bookings.len()
    }
}

/// Transaction over an [`InMemoryBookingStore`].
///
/// Locked rows are copied into a private working set; `commit` writes the
/// working set back in one step. Row guards are released only after that
/// write, so the next holder always reads committed data.
pub struct InMemoryTx {
    tables: Arc<RwLock<Tables>>,
    row_locks: RowLocks,
    guards: HashMap<RowKey, OwnedMutexGuard<()>>,
    tickets: HashMap<TicketId, InventoryItem>,
    bookings: HashMap<BookingId, Booking>,
}

impl InMemoryTx {
    async fn acquire(&mut self, key: RowKey) {
        if self.guards.contains_key(&key) {
            return;
        }

        let lock = {
            let mut locks = self.row_locks.lock().await;
            Arc::clone(locks.entry(key).or_default())
        };
        let guard = lock.lock_owned().await;
        self.guards.insert(key, guard);
    }
}

#[async_trait]
impl BookingTx for InMemoryTx {
    async fn lock_ticket(&mut self, id: TicketId) -> Result<Option<InventoryItem>> {
        self.acquire(RowKey::Ticket(id)).await;

        if let Some(item) = self.tickets.get(&id) {
            return Ok(Some(item.clone()));
        }

        let item = self.tables.read().await.tickets.get(&id).cloned();
        if let Some(ref item) = item {
            self.tickets.insert(id, item.clone());
        }
        Ok(item)
    }

    async fn adjust_quota(&mut self, id: TicketId, delta: i64) -> Result<InventoryItem> {
        if !self.tickets.contains_key(&id) && self.lock_ticket(id).await?.is_none() {
            return Err(BookingError::TicketNotFound(id));
        }
        let item = self
            .tickets
            .get_mut(&id)
            .ok_or(BookingError::TicketNotFound(id))?;

        let updated = i64::from(item.quota) + delta;
        if updated < 0 {
            return Err(BookingError::InsufficientQuota {
                requested: u32::try_from(-delta).unwrap_or(u32::MAX),
                available: item.quota,
            });
        }
        item.quota = u32::try_from(updated)
            .map_err(|_| BookingError::InvalidInput(format!("quota overflow on ticket {id}")))?;

        Ok(item.clone())
    }

    async fn lock_booking(&mut self, id: BookingId) -> Result<Option<Booking>> {
        self.acquire(RowKey::Booking(id)).await;

        if let Some(booking) = self.bookings.get(&id) {
            return Ok(Some(booking.clone()));
        }

        let booking = self.tables.read().await.bookings.get(&id).cloned();
        if let Some(ref booking) = booking {
            self.bookings.insert(id, booking.clone());
        }
        Ok(booking)
    }

    async fn insert_booking(&mut self, booking: &Booking) -> Result<()> {
        self.acquire(RowKey::Booking(booking.id)).await;
        self.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn set_booking_status(&mut self, id: BookingId, status: BookingStatus) -> Result<()> {
        if !self.bookings.contains_key(&id) && self.lock_booking(id).await?.is_none() {
            return Err(BookingError::BookingNotFound(id));
        }
        if let Some(booking) = self.bookings.get_mut(&id) {
            booking.status = status;
        }
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        let InMemoryTx {
            tables,
            guards,
            tickets,
            bookings,
            ..
        } = self;

        {
            let mut tables = tables.write().await;
            tables.tickets.extend(tickets);
            tables.bookings.extend(bookings);
        }

        drop(guards);
        Ok(())
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<InMemoryTx> {
        Ok(InMemoryTx {
            tables: Arc::clone(&self.tables),
            row_locks: Arc::clone(&self.row_locks),
            guards: HashMap::new(),
            tickets: HashMap::new(),
            bookings: HashMap::new(),
        })
    }

    async fn get_event(&self, id: EventId) -> Result<Option<Event>> {
        Ok(self.tables.read().await.events.get(&id).cloned())
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        let tables = self.tables.read().await;
        let mut events: Vec<_> = tables.events.values().cloned().collect();
        events.sort_by_key(|e| e.event_date);
        Ok(events)
    }

    async fn get_ticket(&self, id: TicketId) -> Result<Option<InventoryItem>> {
        Ok(self.tables.read().await.tickets.get(&id).cloned())
    }

    async fn list_tickets_for_event(&self, event_id: EventId) -> Result<Vec<InventoryItem>> {
        let tables = self.tables.read().await;
        let mut items: Vec<_> = tables
            .tickets
            .values()
            .filter(|t| t.event_id == event_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.category.cmp(&b.category));
        Ok(items)
    }

    async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>> {
        Ok(self.tables.read().await.bookings.get(&id).cloned())
    }

    async fn list_bookings(&self, filter: BookingFilter) -> Result<Vec<Booking>> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<_> = tables
            .bookings
            .values()
            .filter(|b| filter.user_id.is_none_or(|user| b.user_id == user))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn find_overdue(&self, now: DateTime<Utc>) -> Result<Vec<BookingId>> {
        let tables = self.tables.read().await;
        let mut overdue: Vec<_> = tables
            .bookings
            .values()
            .filter(|b| b.is_overdue(now))
            .collect();
        overdue.sort_by_key(|b| b.expires_at);
        Ok(overdue.into_iter().map(|b| b.id).collect())
    }

    async fn insert_event(&self, event: &Event) -> Result<()> {
        self.tables
            .write()
            .await
            .events
            .insert(event.id, event.clone());
        Ok(())
    }

    async fn insert_ticket(&self, item: &InventoryItem) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.events.contains_key(&item.event_id) {
            return Err(BookingError::EventNotFound(item.event_id));
        }
        tables.tickets.insert(item.id, item.clone());
        Ok(())
    }
}
