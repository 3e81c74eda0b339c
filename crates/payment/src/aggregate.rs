//! The payment aggregate.

use chrono::{DateTime, Utc};
use common::{BookingId, Money, PaymentId, UserId};
use serde::{Deserialize, Serialize};

use crate::directory::BookingSnapshot;
use crate::error::PaymentError;
use crate::state::{PaymentMethod, PaymentStatus};

/// Currency every payment is charged in.
pub const DEFAULT_CURRENCY: &str = "IDR";

/// A payment attempt for exactly one booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub booking_id: BookingId,
    pub user_id: UserId,
    pub amount: Money,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Opens a pending payment for `booking`, inheriting its user and hold expiry.
    pub fn open(
        booking: &BookingSnapshot,
        amount: Money,
        payment_method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            booking_id: booking.id,
            user_id: booking.user_id,
            amount,
            currency: DEFAULT_CURRENCY.to_string(),
            payment_method,
            status: PaymentStatus::Pending,
            expires_at: booking.expires_at,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a gateway outcome. Only a pending payment accepts one.
    ///
    /// Reporting `Pending` again is accepted and changes nothing.
    pub fn resolve(
        &mut self,
        outcome: PaymentStatus,
        now: DateTime<Utc>,
    ) -> Result<(), PaymentError> {
        if !self.status.is_pending() {
            return Err(PaymentError::NotPending {
                payment_id: self.id,
                status: self.status,
            });
        }

        if outcome.is_pending() {
            return Ok(());
        }

        self.set_status(outcome, now);
        Ok(())
    }

    /// Administrative overwrite. No guard: any status may replace any other.
    pub fn override_status(&mut self, status: PaymentStatus, now: DateTime<Utc>) {
        self.set_status(status, now);
    }

    fn set_status(&mut self, status: PaymentStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
        if status == PaymentStatus::Paid && self.paid_at.is_none() {
            self.paid_at = Some(now);
        }
    }
}
