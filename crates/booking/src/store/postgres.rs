use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{BookingId, EventId, Money, TicketId, UserId};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::aggregate::Booking;
use crate::catalog::{Event, InventoryItem};
use crate::error::{BookingError, Result};
use crate::state::BookingStatus;
use crate::store::{BookingFilter, BookingStore, BookingTx};

const TICKET_COLUMNS: &str = "id, event_id, category, price_minor, quota";
const BOOKING_COLUMNS: &str =
    "id, user_id, event_id, ticket_id, quantity, total_minor, status, expires_at, created_at";

/// PostgreSQL-backed booking store.
#[derive(Clone)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Creates a new PostgreSQL booking store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the booking schema migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations/booking")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_event(row: PgRow) -> Result<Event> {
        Ok(Event {
            id: EventId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            event_date: row.try_get("event_date")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_ticket(row: PgRow) -> Result<InventoryItem> {
        let quota: i32 = row.try_get("quota")?;
        Ok(InventoryItem {
            id: TicketId::from_uuid(row.try_get::<Uuid, _>("id")?),
            event_id: EventId::from_uuid(row.try_get::<Uuid, _>("event_id")?),
            category: row.try_get("category")?,
            price: Money::from_minor(row.try_get("price_minor")?),
            quota: u32::try_from(quota)
                .map_err(|_| BookingError::CorruptRow(format!("negative quota {quota}")))?,
        })
    }

    fn row_to_booking(row: PgRow) -> Result<Booking> {
        let quantity: i32 = row.try_get("quantity")?;
        let status: String = row.try_get("status")?;
        Ok(Booking {
            id: BookingId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            event_id: EventId::from_uuid(row.try_get::<Uuid, _>("event_id")?),
            ticket_id: TicketId::from_uuid(row.try_get::<Uuid, _>("ticket_id")?),
            quantity: u32::try_from(quantity)
                .map_err(|_| BookingError::CorruptRow(format!("negative quantity {quantity}")))?,
            total_amount: Money::from_minor(row.try_get("total_minor")?),
            status: status.parse().map_err(BookingError::CorruptRow)?,
            expires_at: row.try_get("expires_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Transaction over a [`PostgresBookingStore`]. Rolls back on drop.
pub struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BookingTx for PostgresTx {
    async fn lock_ticket(&mut self, id: TicketId) -> Result<Option<InventoryItem>> {
        let row = sqlx::query(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(PostgresBookingStore::row_to_ticket).transpose()
    }

    async fn adjust_quota(&mut self, id: TicketId, delta: i64) -> Result<InventoryItem> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE tickets SET quota = quota + $2
            WHERE id = $1 AND quota + $2 >= 0
            RETURNING {TICKET_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(delta)
        .fetch_optional(&mut *self.tx)
        .await?;

        if let Some(row) = row {
            return PostgresBookingStore::row_to_ticket(row);
        }

        // Nothing updated: either the row is gone or the quota would go negative.
        match self.lock_ticket(id).await? {
            None => Err(BookingError::TicketNotFound(id)),
            Some(item) => Err(BookingError::InsufficientQuota {
                requested: u32::try_from(-delta).unwrap_or(u32::MAX),
                available: item.quota,
            }),
        }
    }

    async fn lock_booking(&mut self, id: BookingId) -> Result<Option<Booking>> {
        let row = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(PostgresBookingStore::row_to_booking).transpose()
    }

    async fn insert_booking(&mut self, booking: &Booking) -> Result<()> {
        let quantity = i32::try_from(booking.quantity)
            .map_err(|_| BookingError::InvalidInput("quantity too large".to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, event_id, ticket_id, quantity, total_minor, status, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(booking.id.as_uuid())
        .bind(booking.user_id.as_uuid())
        .bind(booking.event_id.as_uuid())
        .bind(booking.ticket_id.as_uuid())
        .bind(quantity)
        .bind(booking.total_amount.minor())
        .bind(booking.status.as_str())
        .bind(booking.expires_at)
        .bind(booking.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn set_booking_status(&mut self, id: BookingId, status: BookingStatus) -> Result<()> {
        let result = sqlx::query("UPDATE bookings SET status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(BookingError::BookingNotFound(id));
        }
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl BookingStore for PostgresBookingStore {
    type Tx = PostgresTx;

    async fn begin(&self) -> Result<PostgresTx> {
        Ok(PostgresTx {
            tx: self.pool.begin().await?,
        })
    }

    async fn get_event(&self, id: EventId) -> Result<Option<Event>> {
        let row = sqlx::query(
            "SELECT id, name, description, event_date, created_at FROM events WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_event).transpose()
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        let rows = sqlx::query(
            "SELECT id, name, description, event_date, created_at FROM events ORDER BY event_date ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_event).collect()
    }

    async fn get_ticket(&self, id: TicketId) -> Result<Option<InventoryItem>> {
        let row = sqlx::query(&format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_ticket).transpose()
    }

    async fn list_tickets_for_event(&self, event_id: EventId) -> Result<Vec<InventoryItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE event_id = $1 ORDER BY category ASC"
        ))
        .bind(event_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_ticket).collect()
    }

    async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>> {
        let row = sqlx::query(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_booking).transpose()
    }

    async fn list_bookings(&self, filter: BookingFilter) -> Result<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {BOOKING_COLUMNS} FROM bookings
            WHERE $1::uuid IS NULL OR user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(filter.user_id.map(|u| u.as_uuid()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }

    async fn find_overdue(&self, now: DateTime<Utc>) -> Result<Vec<BookingId>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM bookings
            WHERE status = 'PENDING' AND expires_at <= $1
            ORDER BY expires_at ASC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(BookingId::from_uuid).collect())
    }

    async fn insert_event(&self, event: &Event) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO events (id, name, description, event_date, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.event_date)
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_ticket(&self, item: &InventoryItem) -> Result<()> {
        let quota = i32::try_from(item.quota)
            .map_err(|_| BookingError::InvalidInput("quota too large".to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO tickets (id, event_id, category, price_minor, quota)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.event_id.as_uuid())
        .bind(&item.category)
        .bind(item.price.minor())
        .bind(quota)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("tickets_event_id_fkey") =>
            {
                BookingError::EventNotFound(item.event_id)
            }
            other => BookingError::Database(other),
        })?;

        Ok(())
    }
}
