//! Events and the ticket categories sold for them.

use chrono::{DateTime, Utc};
use common::{EventId, Money, TicketId};
use serde::{Deserialize, Serialize};

/// A ticketed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub description: String,
    pub event_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        event_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EventId::new(),
            name: name.into(),
            description: description.into(),
            event_date,
            created_at: Utc::now(),
        }
    }
}

/// A ticket category and its remaining quota: one row of the inventory ledger.
///
/// `quota` only ever changes through [`crate::ledger`] while the row is
/// locked, and never drops below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: TicketId,
    pub event_id: EventId,
    pub category: String,
    pub price: Money,
    pub quota: u32,
}

impl InventoryItem {
    pub fn new(event_id: EventId, category: impl Into<String>, price: Money, quota: u32) -> Self {
        Self {
            id: TicketId::new(),
            event_id,
            category: category.into(),
            price,
            quota,
        }
    }

    /// Returns true if `quantity` more units can be reserved.
    pub fn can_reserve(&self, quantity: u32) -> bool {
        self.quota >= quantity
    }

    /// Returns the price of `quantity` tickets at the current unit price.
    pub fn price_for(&self, quantity: u32) -> Money {
        self.price.multiply(quantity)
    }
}
