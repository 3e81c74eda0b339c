use async_trait::async_trait;
use common::{BookingId, Money, PaymentId, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::aggregate::Payment;
use crate::error::{PaymentError, Result};
use crate::store::PaymentStore;

const PAYMENT_COLUMNS: &str = "id, booking_id, user_id, amount_minor, currency, payment_method, \
     status, expires_at, paid_at, created_at, updated_at";

const BOOKING_UNIQUE: &str = "payments_booking_id_key";

/// PostgreSQL-backed payment store.
#[derive(Clone)]
pub struct PostgresPaymentStore {
    pool: PgPool,
}

impl PostgresPaymentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the payment schema migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations/payment")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    /// Advisory lock key for a booking: the high half of its UUID.
    fn lock_key(booking_id: BookingId) -> i64 {
        let (high, _) = booking_id.as_uuid().as_u64_pair();
        high as i64
    }

    fn row_to_payment(row: PgRow) -> Result<Payment> {
        let method: String = row.try_get("payment_method")?;
        let status: String = row.try_get("status")?;

        Ok(Payment {
            id: PaymentId::from_uuid(row.try_get::<Uuid, _>("id")?),
            booking_id: BookingId::from_uuid(row.try_get::<Uuid, _>("booking_id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            amount: Money::from_minor(row.try_get("amount_minor")?),
            currency: row.try_get("currency")?,
            payment_method: method.parse().map_err(PaymentError::CorruptRow)?,
            status: status.parse().map_err(PaymentError::CorruptRow)?,
            expires_at: row.try_get("expires_at")?,
            paid_at: row.try_get("paid_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn is_booking_unique_violation(err: &sqlx::Error) -> bool {
        match err {
            sqlx::Error::Database(db_err) => db_err.constraint() == Some(BOOKING_UNIQUE),
            _ => false,
        }
    }
}

#[async_trait]
impl PaymentStore for PostgresPaymentStore {
    async fn insert(&self, payment: &Payment) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent creates for the same booking until commit.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(Self::lock_key(payment.booking_id))
            .execute(&mut *tx)
            .await?;

        let existing: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM payments WHERE booking_id = $1")
                .bind(payment.booking_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;
        if existing.is_some() {
            return Err(PaymentError::AlreadyExists(payment.booking_id));
        }

        sqlx::query(
            r#"
            INSERT INTO payments (id, booking_id, user_id, amount_minor, currency, payment_method,
                                  status, expires_at, paid_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.booking_id.as_uuid())
        .bind(payment.user_id.as_uuid())
        .bind(payment.amount.minor())
        .bind(&payment.currency)
        .bind(payment.payment_method.as_str())
        .bind(payment.status.as_str())
        .bind(payment.expires_at)
        .bind(payment.paid_at)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if Self::is_booking_unique_violation(&e) {
                PaymentError::AlreadyExists(payment.booking_id)
            } else {
                PaymentError::Database(e)
            }
        })?;

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: PaymentId) -> Result<Option<Payment>> {
        let row = sqlx::query(&format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_payment).transpose()
    }

    async fn find_by_booking(&self, booking_id: BookingId) -> Result<Option<Payment>> {
        let row = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE booking_id = $1"
        ))
        .bind(booking_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_payment).transpose()
    }

    async fn list(&self) -> Result<Vec<Payment>> {
        let rows = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_payment).collect()
    }

    async fn update_if_pending(&self, payment: &Payment) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET status = $2, paid_at = $3, updated_at = $4
            WHERE id = $1 AND status = 'PENDING'
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.status.as_str())
        .bind(payment.paid_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        match self.get(payment.id).await? {
            Some(_) => Ok(false),
            None => Err(PaymentError::PaymentNotFound(payment.id)),
        }
    }

    async fn update(&self, payment: &Payment) -> Result<()> {
        let result = sqlx::query(
            "UPDATE payments SET status = $2, paid_at = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(payment.id.as_uuid())
        .bind(payment.status.as_str())
        .bind(payment.paid_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PaymentError::PaymentNotFound(payment.id));
        }
        Ok(())
    }
}
