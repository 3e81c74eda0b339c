//! Inventory ledger.
//!
//! Both operations run inside the caller's transaction and lock the ticket
//! row before reading its quota, so concurrent reservations against one
//! ticket category serialize while unrelated categories proceed in parallel.

use common::TicketId;

use crate::catalog::InventoryItem;
use crate::error::{BookingError, Result};
use crate::store::BookingTx;

/// Takes `quantity` units out of the ticket's quota.
///
/// Fails with `InsufficientQuota` when fewer than `quantity` units remain;
/// the quota is left untouched in that case.
pub async fn reserve<T: BookingTx>(
    tx: &mut T,
    ticket_id: TicketId,
    quantity: u32,
) -> Result<InventoryItem> {
    let item = tx
        .lock_ticket(ticket_id)
        .await?
        .ok_or(BookingError::TicketNotFound(ticket_id))?;

    if !item.can_reserve(quantity) {
        return Err(BookingError::InsufficientQuota {
            requested: quantity,
            available: item.quota,
        });
    }

    tx.adjust_quota(ticket_id, -i64::from(quantity)).await
}

/// Returns `quantity` units to the ticket's quota.
///
/// There is no upper bound check: the caller guarantees the units were
/// previously reserved against this ticket.
pub async fn release<T: BookingTx>(
    tx: &mut T,
    ticket_id: TicketId,
    quantity: u32,
) -> Result<InventoryItem> {
    tx.lock_ticket(ticket_id)
        .await?
        .ok_or(BookingError::TicketNotFound(ticket_id))?;

    tx.adjust_quota(ticket_id, i64::from(quantity)).await
}
