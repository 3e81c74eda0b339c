//! Payment side of the booking-payment saga.

use chrono::Utc;
use common::{BookingId, Money, PaymentId};
use messaging::{BookingEvent, PaymentEvent, PaymentNotification, Publisher};

use crate::aggregate::Payment;
use crate::directory::BookingDirectory;
use crate::error::{PaymentError, Result};
use crate::state::{PaymentMethod, PaymentStatus};
use crate::store::PaymentStore;

/// Command to open a payment for a booking.
#[derive(Debug, Clone, Copy)]
pub struct CreatePayment {
    pub booking_id: BookingId,
    pub amount: Money,
    pub payment_method: PaymentMethod,
}

impl CreatePayment {
    pub fn new(booking_id: BookingId, amount: Money, payment_method: PaymentMethod) -> Self {
        Self {
            booking_id,
            amount,
            payment_method,
        }
    }
}

/// Opens payments against bookings and turns gateway outcomes into
/// notifications for the booking service.
pub struct PaymentCoordinator<S, D, P>
where
    S: PaymentStore,
    D: BookingDirectory,
    P: Publisher<PaymentNotification>,
{
    store: S,
    bookings: D,
    publisher: P,
}

impl<S, D, P> PaymentCoordinator<S, D, P>
where
    S: PaymentStore,
    D: BookingDirectory,
    P: Publisher<PaymentNotification>,
{
    /// Creates a coordinator reading bookings from `bookings` and notifying
    /// the booking service through `publisher`.
    pub fn new(store: S, bookings: D, publisher: P) -> Self {
        Self {
            store,
            bookings,
            publisher,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Opens a pending payment for an existing booking that has none yet.
    #[tracing::instrument(skip(self), fields(booking_id = %cmd.booking_id))]
    pub async fn create_payment(&self, cmd: CreatePayment) -> Result<Payment> {
        if !cmd.amount.is_positive() {
            return Err(PaymentError::InvalidInput(
                "amount must be greater than 0".to_string(),
            ));
        }

        let booking = self.bookings.get_booking(cmd.booking_id).await?;

        if self.store.find_by_booking(cmd.booking_id).await?.is_some() {
            return Err(PaymentError::AlreadyExists(cmd.booking_id));
        }

        let payment = Payment::open(&booking, cmd.amount, cmd.payment_method, Utc::now());
        // The store re-checks under its own lock; the read above only fails fast.
        self.store.insert(&payment).await?;

        metrics::counter!("payments_created_total").increment(1);
        tracing::info!(
            payment_id = %payment.id,
            amount = %payment.amount,
            method = %payment.payment_method,
            "payment created"
        );

        Ok(payment)
    }

    /// Applies an outcome reported by the payment gateway.
    ///
    /// This is the guarded saga transition. The new status is persisted
    /// first; the booking service is then told `payment.success` (PAID) or
    /// `payment.failed` (FAILED, EXPIRED). If that notification fails the
    /// error is returned but the stored status is kept.
    #[tracing::instrument(skip(self))]
    pub async fn handle_gateway_webhook(
        &self,
        payment_id: PaymentId,
        outcome: PaymentStatus,
    ) -> Result<Payment> {
        let mut payment = self
            .store
            .get(payment_id)
            .await?
            .ok_or(PaymentError::PaymentNotFound(payment_id))?;

        if let Err(e) = payment.resolve(outcome, Utc::now()) {
            tracing::warn!(error = %e, "gateway outcome rejected");
            return Err(e);
        }

        if payment.status.is_pending() {
            return Ok(payment);
        }

        if !self.store.update_if_pending(&payment).await? {
            let current = self
                .store
                .get(payment_id)
                .await?
                .map(|p| p.status)
                .unwrap_or(payment.status);
            tracing::warn!(status = %current, "payment resolved concurrently");
            return Err(PaymentError::NotPending {
                payment_id,
                status: current,
            });
        }

        metrics::counter!("payment_transitions_total", "to" => payment.status.as_str())
            .increment(1);
        tracing::info!(status = %payment.status, "payment resolved");

        let event = match payment.status {
            PaymentStatus::Paid => PaymentEvent::Success,
            _ => PaymentEvent::Failed,
        };
        let message = PaymentNotification::new(
            event,
            payment.id,
            payment.booking_id,
            payment.status.as_str(),
        );

        if let Err(e) = self.publisher.publish(message).await {
            metrics::counter!("notifications_failed_total", "target" => "booking").increment(1);
            tracing::warn!(booking_id = %payment.booking_id, %event, error = %e, "booking notification failed");
            return Err(e.into());
        }

        Ok(payment)
    }

    /// Applies a booking lifecycle event delivered by the booking service.
    ///
    /// `booking.expired` and `booking.cancelled` both expire the booking's
    /// open payment. Any other event name is rejected.
    #[tracing::instrument(skip(self))]
    pub async fn handle_booking_notification(
        &self,
        event: &str,
        booking_id: BookingId,
    ) -> Result<Option<Payment>> {
        let event: BookingEvent = event.parse().map_err(PaymentError::UnknownEvent)?;

        match event {
            BookingEvent::Expired | BookingEvent::Cancelled => {
                self.handle_booking_expired(booking_id).await
            }
        }
    }

    /// Expires the pending payment of a booking whose hold ended.
    ///
    /// A booking with no payment, or whose payment is already resolved, is
    /// left alone. Returns the payment as stored afterwards, if any.
    pub async fn handle_booking_expired(&self, booking_id: BookingId) -> Result<Option<Payment>> {
        let Some(mut payment) = self.store.find_by_booking(booking_id).await? else {
            tracing::debug!(%booking_id, "no payment for expired booking");
            return Ok(None);
        };

        if !payment.status.is_pending() {
            return Ok(Some(payment));
        }

        payment.resolve(PaymentStatus::Expired, Utc::now())?;

        if self.store.update_if_pending(&payment).await? {
            metrics::counter!("payment_transitions_total", "to" => payment.status.as_str())
                .increment(1);
            tracing::info!(payment_id = %payment.id, "payment expired with its booking");
            Ok(Some(payment))
        } else {
            self.store.get(payment.id).await
        }
    }

    /// Administrative status overwrite.
    ///
    /// Unlike [`Self::handle_gateway_webhook`] this applies regardless of
    /// the current status and never notifies the booking service.
    #[tracing::instrument(skip(self))]
    pub async fn update_payment_status(
        &self,
        payment_id: PaymentId,
        status: PaymentStatus,
    ) -> Result<Payment> {
        let mut payment = self
            .store
            .get(payment_id)
            .await?
            .ok_or(PaymentError::PaymentNotFound(payment_id))?;

        let previous = payment.status;
        payment.override_status(status, Utc::now());
        self.store.update(&payment).await?;

        tracing::info!(from = %previous, to = %status, "payment status overridden");
        Ok(payment)
    }

    pub async fn get_payment(&self, payment_id: PaymentId) -> Result<Payment> {
        self.store
            .get(payment_id)
            .await?
            .ok_or(PaymentError::PaymentNotFound(payment_id))
    }

    pub async fn list_payments(&self) -> Result<Vec<Payment>> {
        self.store.list().await
    }
}
