//! End-to-end saga tests: a payment coordinator wired to a real booking
//! coordinator through in-process bridges instead of HTTP.

use std::sync::Arc;

use async_trait::async_trait;
use booking::{
    BookingCoordinator, BookingStatus, BookingStore, CreateBooking, Event, InMemoryBookingStore,
    InventoryItem,
};
use chrono::{Duration, Utc};
use common::{BookingId, Money, UserId};
use futures_util::future::join_all;
use messaging::{BookingNotification, InMemoryPublisher, PaymentNotification, PublishError, Publisher};
use payment::{
    BookingDirectory, BookingSnapshot, CreatePayment, InMemoryPaymentStore, PaymentCoordinator,
    PaymentError, PaymentMethod, PaymentStatus, PaymentStore,
};

type Bookings = BookingCoordinator<InMemoryBookingStore, InMemoryPublisher<BookingNotification>>;
type Payments = PaymentCoordinator<InMemoryPaymentStore, BookingBridge, BookingBridge>;

/// Stands in for the booking service's HTTP surface.
#[derive(Clone)]
struct BookingBridge {
    bookings: Arc<Bookings>,
}

#[async_trait]
impl Publisher<PaymentNotification> for BookingBridge {
    async fn publish(&self, message: PaymentNotification) -> Result<(), PublishError> {
        self.bookings
            .handle_payment_notification(message.event.as_str(), message.booking_id)
            .await
            .map(|_| ())
            .map_err(|e| PublishError::Status {
                status: 400,
                body: e.to_string(),
            })
    }
}

#[async_trait]
impl BookingDirectory for BookingBridge {
    async fn get_booking(&self, booking_id: BookingId) -> payment::Result<BookingSnapshot> {
        let booking = self
            .bookings
            .get_booking(booking_id)
            .await
            .map_err(|e| PaymentError::BookingNotFound {
                booking_id,
                reason: e.to_string(),
            })?;

        Ok(BookingSnapshot {
            id: booking.id,
            user_id: booking.user_id,
            event_id: booking.event_id,
            ticket_id: booking.ticket_id,
            quantity: booking.quantity,
            total_amount: booking.total_amount,
            status: booking.status.to_string(),
            expires_at: booking.expires_at,
        })
    }
}

struct TestHarness {
    bookings: Arc<Bookings>,
    booking_outbox: InMemoryPublisher<BookingNotification>,
    payments: Arc<Payments>,
    payment_store: InMemoryPaymentStore,
    event: Event,
    item: InventoryItem,
}

impl TestHarness {
    async fn new(price: i64, quota: u32) -> Self {
        let store = InMemoryBookingStore::new();
        let event = Event::new("Jazz Festival", "Three days of jazz", Utc::now());
        store.insert_event(&event).await.unwrap();
        let item = InventoryItem::new(event.id, "VIP", Money::from_major(price), quota);
        store.insert_ticket(&item).await.unwrap();

        let booking_outbox = InMemoryPublisher::new();
        let bookings = Arc::new(BookingCoordinator::new(store, booking_outbox.clone()));

        let bridge = BookingBridge {
            bookings: Arc::clone(&bookings),
        };
        let payment_store = InMemoryPaymentStore::new();
        let payments = Arc::new(PaymentCoordinator::new(
            payment_store.clone(),
            bridge.clone(),
            bridge,
        ));

        Self {
            bookings,
            booking_outbox,
            payments,
            payment_store,
            event,
            item,
        }
    }

    async fn book(&self, quantity: u32) -> booking::Booking {
        self.bookings
            .create_booking(CreateBooking::new(
                UserId::new(),
                self.event.id,
                self.item.id,
                quantity,
            ))
            .await
            .unwrap()
    }

    async fn pay(&self, booking_id: BookingId) -> payment::Payment {
        self.payments
            .create_payment(CreatePayment::new(
                booking_id,
                Money::from_major(150),
                PaymentMethod::VirtualAccount,
            ))
            .await
            .unwrap()
    }

    async fn quota(&self) -> u32 {
        self.bookings.get_ticket(self.item.id).await.unwrap().quota
    }

    /// Delivers everything the booking service published to the payment service.
    async fn flush_booking_outbox(&self, already_delivered: usize) {
        for message in self
            .booking_outbox
            .sent()
            .await
            .into_iter()
            .skip(already_delivered)
        {
            self.payments
                .handle_booking_notification(message.event.as_str(), message.booking_id)
                .await
                .unwrap();
        }
    }
}

#[tokio::test]
async fn test_paid_payment_confirms_booking() {
    let h = TestHarness::new(75, 10).await;
    let booking = h.book(2).await;
    let payment = h.pay(booking.id).await;
    assert_eq!(payment.expires_at, booking.expires_at);

    let paid = h
        .payments
        .handle_gateway_webhook(payment.id, PaymentStatus::Paid)
        .await
        .unwrap();

    assert_eq!(paid.status, PaymentStatus::Paid);
    assert!(paid.paid_at.is_some());
    let booking = h.bookings.get_booking(booking.id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(h.quota().await, 8);
}

#[tokio::test]
async fn test_failed_payment_cancels_booking_and_releases() {
    let h = TestHarness::new(75, 10).await;
    let booking = h.book(4).await;
    let payment = h.pay(booking.id).await;
    assert_eq!(h.quota().await, 6);

    h.payments
        .handle_gateway_webhook(payment.id, PaymentStatus::Failed)
        .await
        .unwrap();

    let booking = h.bookings.get_booking(booking.id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);
    assert_eq!(h.quota().await, 10);
}

#[tokio::test]
async fn test_second_payment_for_booking_already_exists() {
    let h = TestHarness::new(75, 10).await;
    let booking = h.book(1).await;
    h.pay(booking.id).await;

    let second = h
        .payments
        .create_payment(CreatePayment::new(
            booking.id,
            Money::from_major(75),
            PaymentMethod::EWallet,
        ))
        .await;

    assert!(matches!(second, Err(PaymentError::AlreadyExists(_))));
    assert_eq!(h.payment_store.len().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_payment_creation_yields_one_row() {
    let h = TestHarness::new(75, 10).await;
    let booking = h.book(1).await;

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let payments = Arc::clone(&h.payments);
            let cmd = CreatePayment::new(booking.id, Money::from_major(75), PaymentMethod::Qris);
            tokio::spawn(async move { payments.create_payment(cmd).await })
        })
        .collect();

    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| matches!(r, Err(PaymentError::AlreadyExists(_))))
    );
    assert_eq!(h.payment_store.len().await, 1);
}

#[tokio::test]
async fn test_payment_for_unknown_booking() {
    let h = TestHarness::new(75, 10).await;

    let result = h
        .payments
        .create_payment(CreatePayment::new(
            BookingId::new(),
            Money::from_major(75),
            PaymentMethod::Qris,
        ))
        .await;

    assert!(matches!(result, Err(PaymentError::BookingNotFound { .. })));
}

#[tokio::test]
async fn test_expired_hold_expires_open_payment() {
    let h = TestHarness::new(75, 10).await;
    let booking = h.book(3).await;
    let payment = h.pay(booking.id).await;

    let report = h
        .bookings
        .expire_overdue(Utc::now() + Duration::minutes(16))
        .await
        .unwrap();
    assert_eq!(report.expired, vec![booking.id]);
    h.flush_booking_outbox(0).await;

    let payment = h.payments.get_payment(payment.id).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Expired);
    assert_eq!(h.quota().await, 10);

    let late = h
        .payments
        .handle_gateway_webhook(payment.id, PaymentStatus::Paid)
        .await;
    assert!(matches!(late, Err(PaymentError::NotPending { .. })));
}

#[tokio::test]
async fn test_late_payment_after_expiry_is_reported_upstream() {
    let h = TestHarness::new(75, 10).await;
    let booking = h.book(2).await;
    let payment = h.pay(booking.id).await;

    // Hold lapses but the booking.expired message never reaches the payment service.
    h.bookings
        .expire_overdue(Utc::now() + Duration::minutes(16))
        .await
        .unwrap();

    let result = h
        .payments
        .handle_gateway_webhook(payment.id, PaymentStatus::Paid)
        .await;

    assert!(matches!(result, Err(PaymentError::Notification(_))));
    let stored = h.payment_store.get(payment.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PaymentStatus::Paid);
    let booking = h.bookings.get_booking(booking.id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);
    assert_eq!(h.quota().await, 10);
}

#[tokio::test]
async fn test_manual_cancel_expires_payment() {
    let h = TestHarness::new(75, 10).await;
    let booking = h.book(1).await;
    let payment = h.pay(booking.id).await;

    h.bookings
        .change_booking_status(booking.id, BookingStatus::Cancelled)
        .await
        .unwrap();
    h.flush_booking_outbox(0).await;

    let payment = h.payments.get_payment(payment.id).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Expired);
}

#[tokio::test]
async fn test_duplicate_gateway_webhook_does_not_reach_booking_twice() {
    let h = TestHarness::new(75, 10).await;
    let booking = h.book(2).await;
    let payment = h.pay(booking.id).await;

    h.payments
        .handle_gateway_webhook(payment.id, PaymentStatus::Paid)
        .await
        .unwrap();
    let duplicate = h
        .payments
        .handle_gateway_webhook(payment.id, PaymentStatus::Paid)
        .await;

    assert!(matches!(duplicate, Err(PaymentError::NotPending { .. })));
    let booking = h.bookings.get_booking(booking.id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(h.quota().await, 8);
}
