//! Payment storage.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use common::{BookingId, PaymentId};

use crate::aggregate::Payment;
use crate::error::Result;

pub use memory::InMemoryPaymentStore;
pub use postgres::PostgresPaymentStore;

/// Persistence for payments.
///
/// Implementations enforce at most one payment per booking at the storage
/// level, independently of any check the caller made beforehand.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Inserts a new payment. Fails with `AlreadyExists` if its booking
    /// already has one.
    async fn insert(&self, payment: &Payment) -> Result<()>;

    async fn get(&self, id: PaymentId) -> Result<Option<Payment>>;

    async fn find_by_booking(&self, booking_id: BookingId) -> Result<Option<Payment>>;

    /// Lists payments, newest first.
    async fn list(&self) -> Result<Vec<Payment>>;

    /// Writes `payment` only if the stored row is still `Pending`.
    ///
    /// Returns `false`, writing nothing, when another writer resolved the
    /// payment first.
    async fn update_if_pending(&self, payment: &Payment) -> Result<bool>;

    /// Writes `payment` unconditionally.
    async fn update(&self, payment: &Payment) -> Result<()>;
}
