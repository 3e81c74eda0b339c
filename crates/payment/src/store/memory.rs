use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{BookingId, PaymentId};
use tokio::sync::RwLock;

use crate::aggregate::Payment;
use crate::error::{PaymentError, Result};
use crate::store::PaymentStore;

#[derive(Debug, Default)]
struct Tables {
    payments: HashMap<PaymentId, Payment>,
    by_booking: HashMap<BookingId, PaymentId>,
}

/// In-memory payment store for testing and local runs.
///
/// Existence check and insert happen under one write lock, which gives the
/// same one-payment-per-booking guarantee as the unique index in Postgres.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of payments stored.
    pub async fn len(&self) -> usize {
        self.tables.read().await.payments.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, payment: &Payment) -> Result<()> {
        let mut tables = self.tables.write().await;

        if tables.by_booking.contains_key(&payment.booking_id) {
            return Err(PaymentError::AlreadyExists(payment.booking_id));
        }

        tables.by_booking.insert(payment.booking_id, payment.id);
        tables.payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn get(&self, id: PaymentId) -> Result<Option<Payment>> {
        Ok(self.tables.read().await.payments.get(&id).cloned())
    }

    async fn find_by_booking(&self, booking_id: BookingId) -> Result<Option<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_booking
            .get(&booking_id)
            .and_then(|id| tables.payments.get(id))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Payment>> {
        let tables = self.tables.read().await;
        let mut payments: Vec<_> = tables.payments.values().cloned().collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payments)
    }

    async fn update_if_pending(&self, payment: &Payment) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .payments
            .get_mut(&payment.id)
            .ok_or(PaymentError::PaymentNotFound(payment.id))?;

        if !stored.status.is_pending() {
            return Ok(false);
        }

        *stored = payment.clone();
        Ok(true)
    }

    async fn update(&self, payment: &Payment) -> Result<()> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .payments
            .get_mut(&payment.id)
            .ok_or(PaymentError::PaymentNotFound(payment.id))?;

        *stored = payment.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::BookingSnapshot;
    use crate::state::{PaymentMethod, PaymentStatus};
    use chrono::Utc;
    use common::{EventId, Money, TicketId, UserId};

    fn payment_for(booking_id: BookingId) -> Payment {
        let booking = BookingSnapshot {
            id: booking_id,
            user_id: UserId::new(),
            event_id: EventId::new(),
            ticket_id: TicketId::new(),
            quantity: 1,
            total_amount: Money::from_major(100),
            status: "PENDING".to_string(),
            expires_at: None,
        };
        Payment::open(&booking, Money::from_major(100), PaymentMethod::VirtualAccount, Utc::now())
    }

    #[tokio::test]
    async fn test_second_payment_for_booking_is_rejected() {
        let store = InMemoryPaymentStore::new();
        let booking_id = BookingId::new();

        store.insert(&payment_for(booking_id)).await.unwrap();
        let result = store.insert(&payment_for(booking_id)).await;

        assert!(matches!(result, Err(PaymentError::AlreadyExists(id)) if id == booking_id));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_if_pending_is_compare_and_set() {
        let store = InMemoryPaymentStore::new();
        let payment = payment_for(BookingId::new());
        store.insert(&payment).await.unwrap();

        let mut paid = payment.clone();
        paid.resolve(PaymentStatus::Paid, Utc::now()).unwrap();
        assert!(store.update_if_pending(&paid).await.unwrap());

        let mut failed = payment.clone();
        failed.resolve(PaymentStatus::Failed, Utc::now()).unwrap();
        assert!(!store.update_if_pending(&failed).await.unwrap());

        let stored = store.get(payment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_find_by_booking() {
        let store = InMemoryPaymentStore::new();
        let payment = payment_for(BookingId::new());
        store.insert(&payment).await.unwrap();

        let found = store.find_by_booking(payment.booking_id).await.unwrap();
        assert_eq!(found, Some(payment));
        assert!(
            store
                .find_by_booking(BookingId::new())
                .await
                .unwrap()
                .is_none()
        );
    }
}
