//! Booking side of the booking-payment saga.

use std::time::Instant;

use chrono::{DateTime, Utc};
use common::{BookingId, EventId, TicketId, UserId};
use messaging::{BookingEvent, BookingNotification, PaymentEvent, Publisher};

use crate::aggregate::{Booking, Transition};
use crate::catalog::{Event, InventoryItem};
use crate::error::{BookingError, Result};
use crate::ledger;
use crate::state::BookingStatus;
use crate::store::{BookingFilter, BookingStore, BookingTx};

/// Command to reserve tickets for a user.
#[derive(Debug, Clone, Copy)]
pub struct CreateBooking {
    pub user_id: UserId,
    pub event_id: EventId,
    pub ticket_id: TicketId,
    pub quantity: u32,
}

impl CreateBooking {
    pub fn new(user_id: UserId, event_id: EventId, ticket_id: TicketId, quantity: u32) -> Self {
        Self {
            user_id,
            event_id,
            ticket_id,
            quantity,
        }
    }
}

/// Outcome of one expiry sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpiryReport {
    /// Bookings cancelled by this sweep.
    pub expired: Vec<BookingId>,
    /// Bookings that left `Pending` between the scan and the lock.
    pub skipped: usize,
    /// Bookings whose cancellation failed and will be retried next sweep.
    pub failed: usize,
    /// Cancelled bookings whose `booking.expired` notification was not delivered.
    pub notify_failures: usize,
}

/// Creates bookings under the inventory lock and drives them to a terminal
/// status in response to payment outcomes, manual requests and expiry.
///
/// Every status change goes through [`Booking::transition`], whose
/// pending-only guard is what makes duplicate or late webhooks harmless.
pub struct BookingCoordinator<S, P>
where
    S: BookingStore,
    P: Publisher<BookingNotification>,
{
    store: S,
    publisher: P,
}

impl<S, P> BookingCoordinator<S, P>
where
    S: BookingStore,
    P: Publisher<BookingNotification>,
{
    /// Creates a coordinator over `store` that notifies the payment service via `publisher`.
    pub fn new(store: S, publisher: P) -> Self {
        Self { store, publisher }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reserves inventory and records a pending booking, atomically.
    ///
    /// Nothing is written unless both the booking row and the quota
    /// decrement commit together.
    #[tracing::instrument(skip(self), fields(ticket_id = %cmd.ticket_id, quantity = cmd.quantity))]
    pub async fn create_booking(&self, cmd: CreateBooking) -> Result<Booking> {
        let started = Instant::now();
        let result = self.reserve_and_record(cmd).await;
        metrics::histogram!("booking_create_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(booking) => {
                metrics::counter!("bookings_created_total").increment(1);
                tracing::info!(
                    booking_id = %booking.id,
                    total = %booking.total_amount,
                    "booking created"
                );
            }
            Err(e) => {
                metrics::counter!("bookings_rejected_total", "reason" => e.reason()).increment(1);
                tracing::warn!(error = %e, "booking rejected");
            }
        }

        result
    }

    async fn reserve_and_record(&self, cmd: CreateBooking) -> Result<Booking> {
        if cmd.quantity == 0 {
            return Err(BookingError::InvalidInput(
                "quantity must be greater than zero".to_string(),
            ));
        }

        self.store
            .get_event(cmd.event_id)
            .await?
            .ok_or(BookingError::EventNotFound(cmd.event_id))?;

        let mut tx = self.store.begin().await?;

        let item = tx
            .lock_ticket(cmd.ticket_id)
            .await?
            .ok_or(BookingError::TicketNotFound(cmd.ticket_id))?;

        if item.event_id != cmd.event_id {
            return Err(BookingError::TicketEventMismatch {
                ticket_id: cmd.ticket_id,
                event_id: cmd.event_id,
            });
        }

        if !item.can_reserve(cmd.quantity) {
            return Err(BookingError::InsufficientQuota {
                requested: cmd.quantity,
                available: item.quota,
            });
        }

        let booking = Booking::reserve(cmd.user_id, &item, cmd.quantity, Utc::now());
        tx.insert_booking(&booking).await?;
        ledger::reserve(&mut tx, item.id, cmd.quantity).await?;

        tx.commit().await?;
        Ok(booking)
    }

    /// Moves a pending booking to `target`, releasing its inventory on cancel.
    ///
    /// This is the guarded saga transition: it fails with `NotPending` once
    /// the booking has left `Pending`, and never notifies the payment service.
    #[tracing::instrument(skip(self))]
    pub async fn update_booking_status(
        &self,
        booking_id: BookingId,
        target: BookingStatus,
    ) -> Result<Booking> {
        let mut tx = self.store.begin().await?;

        let mut booking = tx
            .lock_booking(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))?;

        let effect = match booking.transition(target) {
            Ok(effect) => effect,
            Err(e) => {
                tracing::warn!(error = %e, "booking transition rejected");
                return Err(e);
            }
        };

        let released = match effect {
            Transition::Keep => {
                tx.set_booking_status(booking_id, booking.status).await?;
                0
            }
            Transition::Release {
                ticket_id,
                quantity,
            } => {
                tx.lock_ticket(ticket_id)
                    .await?
                    .ok_or(BookingError::TicketNotFound(ticket_id))?;
                tx.set_booking_status(booking_id, booking.status).await?;
                ledger::release(&mut tx, ticket_id, quantity).await?;
                quantity
            }
        };

        tx.commit().await?;

        metrics::counter!("booking_transitions_total", "to" => booking.status.as_str())
            .increment(1);
        if released > 0 {
            metrics::counter!("inventory_released_units_total").increment(u64::from(released));
        }
        tracing::info!(status = %booking.status, released, "booking transitioned");

        Ok(booking)
    }

    /// Applies a status change requested directly by a client.
    ///
    /// Same guard as [`Self::update_booking_status`]; a successful cancel is
    /// also announced to the payment service so an open payment can expire.
    /// That announcement is best effort: a delivery failure is logged and the
    /// committed cancel stands.
    pub async fn change_booking_status(
        &self,
        booking_id: BookingId,
        target: BookingStatus,
    ) -> Result<Booking> {
        let booking = self.update_booking_status(booking_id, target).await?;

        if booking.status == BookingStatus::Cancelled {
            let _ = self.notify_payment(BookingEvent::Cancelled, &booking).await;
        }

        Ok(booking)
    }

    /// Applies a payment outcome delivered by the payment service.
    ///
    /// `payment.success` confirms the booking; `payment.failed` and
    /// `payment.expired` cancel it. Any other event name is rejected.
    #[tracing::instrument(skip(self))]
    pub async fn handle_payment_notification(
        &self,
        event: &str,
        booking_id: BookingId,
    ) -> Result<Booking> {
        let event: PaymentEvent = event.parse().map_err(BookingError::UnknownEvent)?;

        let target = match event {
            PaymentEvent::Success => BookingStatus::Confirmed,
            PaymentEvent::Failed | PaymentEvent::Expired => BookingStatus::Cancelled,
        };

        self.update_booking_status(booking_id, target).await
    }

    /// Cancels every pending booking whose hold lapsed at or before `now` and
    /// tells the payment service about each one.
    ///
    /// A booking confirmed between the scan and its lock is skipped. Storage
    /// errors on one booking do not stop the sweep.
    #[tracing::instrument(skip(self))]
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<ExpiryReport> {
        let overdue = self.store.find_overdue(now).await?;
        let mut report = ExpiryReport::default();

        for booking_id in overdue {
            match self
                .update_booking_status(booking_id, BookingStatus::Cancelled)
                .await
            {
                Ok(booking) => {
                    metrics::counter!("bookings_expired_total").increment(1);
                    if self
                        .notify_payment(BookingEvent::Expired, &booking)
                        .await
                        .is_err()
                    {
                        report.notify_failures += 1;
                    }
                    report.expired.push(booking_id);
                }
                Err(BookingError::NotPending { .. }) => report.skipped += 1,
                Err(e) => {
                    tracing::error!(%booking_id, error = %e, "failed to expire booking");
                    report.failed += 1;
                }
            }
        }

        if !report.expired.is_empty() || report.failed > 0 {
            tracing::info!(
                expired = report.expired.len(),
                skipped = report.skipped,
                failed = report.failed,
                notify_failures = report.notify_failures,
                "expiry sweep finished"
            );
        }

        Ok(report)
    }

    async fn notify_payment(&self, event: BookingEvent, booking: &Booking) -> Result<()> {
        let message = BookingNotification::new(event, booking.id, booking.status.as_str());

        if let Err(e) = self.publisher.publish(message).await {
            metrics::counter!("notifications_failed_total", "target" => "payment").increment(1);
            tracing::warn!(booking_id = %booking.id, %event, error = %e, "payment notification failed");
            return Err(e.into());
        }
        Ok(())
    }

    /// Gets a booking by id.
    pub async fn get_booking(&self, booking_id: BookingId) -> Result<Booking> {
        self.store
            .get_booking(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))
    }

    pub async fn list_bookings(&self, filter: BookingFilter) -> Result<Vec<Booking>> {
        self.store.list_bookings(filter).await
    }

    pub async fn list_events(&self) -> Result<Vec<Event>> {
        self.store.list_events().await
    }

    pub async fn get_event(&self, event_id: EventId) -> Result<Event> {
        self.store
            .get_event(event_id)
            .await?
            .ok_or(BookingError::EventNotFound(event_id))
    }

    /// Lists the ticket categories of an existing event.
    pub async fn list_tickets(&self, event_id: EventId) -> Result<Vec<InventoryItem>> {
        self.get_event(event_id).await?;
        self.store.list_tickets_for_event(event_id).await
    }

    pub async fn get_ticket(&self, ticket_id: TicketId) -> Result<InventoryItem> {
        self.store
            .get_ticket(ticket_id)
            .await?
            .ok_or(BookingError::TicketNotFound(ticket_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryBookingStore;
    use chrono::Duration;
    use common::Money;
    use messaging::InMemoryPublisher;

    type TestCoordinator =
        BookingCoordinator<InMemoryBookingStore, InMemoryPublisher<BookingNotification>>;

    struct Fixture {
        coordinator: TestCoordinator,
        publisher: InMemoryPublisher<BookingNotification>,
        event: Event,
        item: InventoryItem,
    }

    async fn fixture(price: i64, quota: u32) -> Fixture {
        let store = InMemoryBookingStore::new();
        let event = Event::new("Tech Conference", "Keynotes and workshops", Utc::now());
        store.insert_event(&event).await.unwrap();
        let item = InventoryItem::new(event.id, "Regular", Money::from_major(price), quota);
        store.insert_ticket(&item).await.unwrap();

        let publisher = InMemoryPublisher::new();
        Fixture {
            coordinator: BookingCoordinator::new(store, publisher.clone()),
            publisher,
            event,
            item,
        }
    }

    impl Fixture {
        fn cmd(&self, quantity: u32) -> CreateBooking {
            CreateBooking::new(UserId::new(), self.event.id, self.item.id, quantity)
        }

        async fn quota(&self) -> u32 {
            self.coordinator.get_ticket(self.item.id).await.unwrap().quota
        }
    }

    #[tokio::test]
    async fn test_create_booking_prices_and_holds() {
        let f = fixture(75, 10).await;

        let booking = f.coordinator.create_booking(f.cmd(2)).await.unwrap();

        assert_eq!(booking.total_amount, Money::from_minor(15_000));
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(
            booking.expires_at,
            Some(booking.created_at + Duration::minutes(15))
        );
        assert_eq!(f.quota().await, 8);
    }

    #[tokio::test]
    async fn test_create_booking_rejects_zero_quantity() {
        let f = fixture(75, 10).await;

        let result = f.coordinator.create_booking(f.cmd(0)).await;

        assert!(matches!(result, Err(BookingError::InvalidInput(_))));
        assert_eq!(f.quota().await, 10);
    }

    #[tokio::test]
    async fn test_create_booking_unknown_event() {
        let f = fixture(75, 10).await;
        let cmd = CreateBooking::new(UserId::new(), EventId::new(), f.item.id, 1);

        let result = f.coordinator.create_booking(cmd).await;

        assert!(matches!(result, Err(BookingError::EventNotFound(_))));
    }

    #[tokio::test]
    async fn test_create_booking_ticket_of_other_event() {
        let f = fixture(75, 10).await;
        let other = Event::new("Other", "Elsewhere", Utc::now());
        f.coordinator.store().insert_event(&other).await.unwrap();
        let cmd = CreateBooking::new(UserId::new(), other.id, f.item.id, 1);

        let result = f.coordinator.create_booking(cmd).await;

        assert!(matches!(
            result,
            Err(BookingError::TicketEventMismatch { .. })
        ));
        assert_eq!(f.quota().await, 10);
    }

    #[tokio::test]
    async fn test_insufficient_quota_leaves_no_trace() {
        let f = fixture(75, 2).await;

        let result = f.coordinator.create_booking(f.cmd(3)).await;

        assert!(matches!(
            result,
            Err(BookingError::InsufficientQuota {
                requested: 3,
                available: 2
            })
        ));
        assert_eq!(f.quota().await, 2);
        assert_eq!(f.coordinator.store().booking_count().await, 0);
    }

    #[tokio::test]
    async fn test_cancel_releases_inventory_once() {
        let f = fixture(75, 14).await;
        let booking = f.coordinator.create_booking(f.cmd(4)).await.unwrap();
        assert_eq!(f.quota().await, 10);

        let cancelled = f
            .coordinator
            .update_booking_status(booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(f.quota().await, 14);

        let again = f
            .coordinator
            .update_booking_status(booking.id, BookingStatus::Cancelled)
            .await;
        assert!(matches!(again, Err(BookingError::NotPending { .. })));
        assert_eq!(f.quota().await, 14);
    }

    #[tokio::test]
    async fn test_payment_success_confirms_and_keeps_quota() {
        let f = fixture(75, 10).await;
        let booking = f.coordinator.create_booking(f.cmd(3)).await.unwrap();

        let confirmed = f
            .coordinator
            .handle_payment_notification("payment.success", booking.id)
            .await
            .unwrap();

        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert_eq!(f.quota().await, 7);
    }

    #[tokio::test]
    async fn test_duplicate_payment_notification_is_rejected() {
        let f = fixture(75, 10).await;
        let booking = f.coordinator.create_booking(f.cmd(3)).await.unwrap();
        f.coordinator
            .handle_payment_notification("payment.success", booking.id)
            .await
            .unwrap();

        let duplicate = f
            .coordinator
            .handle_payment_notification("payment.success", booking.id)
            .await;
        let late_failure = f
            .coordinator
            .handle_payment_notification("payment.failed", booking.id)
            .await;

        assert!(matches!(duplicate, Err(BookingError::NotPending { .. })));
        assert!(matches!(late_failure, Err(BookingError::NotPending { .. })));
        let stored = f.coordinator.get_booking(booking.id).await.unwrap();
        assert_eq!(stored.status, BookingStatus::Confirmed);
        assert_eq!(f.quota().await, 7);
    }

    #[tokio::test]
    async fn test_payment_failed_and_expired_cancel() {
        let f = fixture(75, 10).await;

        for event in ["payment.failed", "payment.expired"] {
            let booking = f.coordinator.create_booking(f.cmd(2)).await.unwrap();
            let cancelled = f
                .coordinator
                .handle_payment_notification(event, booking.id)
                .await
                .unwrap();
            assert_eq!(cancelled.status, BookingStatus::Cancelled);
        }

        assert_eq!(f.quota().await, 10);
        assert_eq!(f.publisher.sent_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_payment_event() {
        let f = fixture(75, 10).await;
        let booking = f.coordinator.create_booking(f.cmd(1)).await.unwrap();

        let result = f
            .coordinator
            .handle_payment_notification("payment.refunded", booking.id)
            .await;

        assert!(matches!(result, Err(BookingError::UnknownEvent(e)) if e == "payment.refunded"));
    }

    #[tokio::test]
    async fn test_update_unknown_booking() {
        let f = fixture(75, 10).await;

        let result = f
            .coordinator
            .update_booking_status(BookingId::new(), BookingStatus::Confirmed)
            .await;

        assert!(matches!(result, Err(BookingError::BookingNotFound(_))));
    }

    #[tokio::test]
    async fn test_manual_cancel_notifies_payment() {
        let f = fixture(75, 10).await;
        let booking = f.coordinator.create_booking(f.cmd(1)).await.unwrap();

        f.coordinator
            .change_booking_status(booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();

        let sent = f.publisher.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].event, BookingEvent::Cancelled);
        assert_eq!(sent[0].booking_id, booking.id);
        assert_eq!(sent[0].status, "CANCELLED");
    }

    #[tokio::test]
    async fn test_manual_cancel_survives_notification_failure() {
        let f = fixture(75, 10).await;
        let booking = f.coordinator.create_booking(f.cmd(1)).await.unwrap();
        f.publisher.set_fail_on_publish(true).await;

        let cancelled = f
            .coordinator
            .change_booking_status(booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();

        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(f.quota().await, 10);
    }

    #[tokio::test]
    async fn test_manual_confirm_does_not_notify() {
        let f = fixture(75, 10).await;
        let booking = f.coordinator.create_booking(f.cmd(1)).await.unwrap();

        f.coordinator
            .change_booking_status(booking.id, BookingStatus::Confirmed)
            .await
            .unwrap();

        assert_eq!(f.publisher.sent_count().await, 0);
    }

    #[tokio::test]
    async fn test_expire_overdue_cancels_and_notifies() {
        let f = fixture(75, 10).await;
        let stale = f.coordinator.create_booking(f.cmd(2)).await.unwrap();
        let paid = f.coordinator.create_booking(f.cmd(3)).await.unwrap();
        f.coordinator
            .handle_payment_notification("payment.success", paid.id)
            .await
            .unwrap();

        let later = Utc::now() + Duration::minutes(16);
        let report = f.coordinator.expire_overdue(later).await.unwrap();

        assert_eq!(report.expired, vec![stale.id]);
        assert_eq!(report.notify_failures, 0);
        assert_eq!(f.quota().await, 7);

        let sent = f.publisher.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].event, BookingEvent::Expired);
        assert_eq!(sent[0].booking_id, stale.id);
    }

    #[tokio::test]
    async fn test_expire_overdue_ignores_live_holds() {
        let f = fixture(75, 10).await;
        f.coordinator.create_booking(f.cmd(2)).await.unwrap();

        let report = f.coordinator.expire_overdue(Utc::now()).await.unwrap();

        assert!(report.expired.is_empty());
        assert_eq!(f.quota().await, 8);
    }

    #[tokio::test]
    async fn test_expire_overdue_counts_notify_failures() {
        let f = fixture(75, 10).await;
        let booking = f.coordinator.create_booking(f.cmd(2)).await.unwrap();
        f.publisher.set_fail_on_publish(true).await;

        let report = f
            .coordinator
            .expire_overdue(Utc::now() + Duration::minutes(15))
            .await
            .unwrap();

        assert_eq!(report.expired, vec![booking.id]);
        assert_eq!(report.notify_failures, 1);
        let stored = f.coordinator.get_booking(booking.id).await.unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_list_tickets_requires_event() {
        let f = fixture(75, 10).await;

        let tickets = f.coordinator.list_tickets(f.event.id).await.unwrap();
        assert_eq!(tickets, vec![f.item.clone()]);

        let missing = f.coordinator.list_tickets(EventId::new()).await;
        assert!(matches!(missing, Err(BookingError::EventNotFound(_))));
    }
}
