//! The booking aggregate.

use chrono::{DateTime, Duration, Utc};
use common::{BookingId, EventId, Money, TicketId, UserId};
use serde::{Deserialize, Serialize};

use crate::catalog::InventoryItem;
use crate::error::BookingError;
use crate::state::BookingStatus;

/// How long a pending booking holds its inventory.
pub const HOLD_MINUTES: i64 = 15;

/// A reservation of `quantity` tickets of one category for one user.
///
/// `total_amount` is fixed at reservation time and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub event_id: EventId,
    pub ticket_id: TicketId,
    pub quantity: u32,
    pub total_amount: Money,
    pub status: BookingStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Side effect a successful transition requires from the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Quota stays consumed.
    Keep,
    /// `quantity` units go back to the item's quota.
    Release { ticket_id: TicketId, quantity: u32 },
}

impl Booking {
    /// Builds a pending booking against `item`, priced and timed at `now`.
    pub fn reserve(
        user_id: UserId,
        item: &InventoryItem,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BookingId::new(),
            user_id,
            event_id: item.event_id,
            ticket_id: item.id,
            quantity,
            total_amount: item.price_for(quantity),
            status: BookingStatus::Pending,
            expires_at: Some(now + Duration::minutes(HOLD_MINUTES)),
            created_at: now,
        }
    }

    /// Applies a status transition, enforcing the pending-only guard.
    ///
    /// The guard is checked before the target, so a request against a booking
    /// that already left `Pending` is always reported as `NotPending`.
    pub fn transition(&mut self, target: BookingStatus) -> Result<Transition, BookingError> {
        if !self.status.is_pending() {
            return Err(BookingError::NotPending {
                booking_id: self.id,
                status: self.status,
            });
        }

        if !self.status.can_transition_to(target) {
            return Err(BookingError::InvalidInput(format!(
                "cannot move booking to {target}"
            )));
        }

        self.status = target;
        Ok(match target {
            BookingStatus::Cancelled => Transition::Release {
                ticket_id: self.ticket_id,
                quantity: self.quantity,
            },
            _ => Transition::Keep,
        })
    }

    /// Returns true if the hold has lapsed at `now` and the booking is still pending.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status.is_pending() && self.expires_at.is_some_and(|at| at <= now)
    }
}
