use async_trait::async_trait;
use uuid::Uuid;
use sqlx::{PgPool, Postgres, QueryBuilder};
use chrono::{DateTime, Utc};
use marquee_core::booking::{Booking, BookingStatus, EventFields, SeatRestoration};
use marquee_core::repository::{BookingFilter, BookingRepository, RepoResult};
use marquee_shared::Masked;

const BOOKING_COLUMNS: &str = "id, booking_reference, user_id, user_email, event_id, event_title, event_date, \
     event_venue, event_time, number_of_tickets, price_per_ticket, total_amount, payment_method, \
     transaction_id, booking_status, payment_status, seat_restoration, created_at, updated_at";

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    booking_reference: String,
    user_id: String,
    user_email: Option<String>,
    event_id: String,
    event_title: String,
    event_date: DateTime<Utc>,
    event_venue: String,
    event_time: String,
    number_of_tickets: i32,
    price_per_ticket: f64,
    total_amount: f64,
    payment_method: String,
    transaction_id: Option<String>,
    booking_status: String,
    payment_status: String,
    seat_restoration: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = Box<dyn std::error::Error + Send + Sync>;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            booking_reference: row.booking_reference,
            user_id: row.user_id,
            user_email: row.user_email.map(Masked),
            event_id: row.event_id,
            event_title: row.event_title,
            event_date: row.event_date,
            event_venue: row.event_venue,
            event_time: row.event_time,
            number_of_tickets: row.number_of_tickets,
            price_per_ticket: row.price_per_ticket,
            total_amount: row.total_amount,
            payment_method: row.payment_method,
            transaction_id: row.transaction_id,
            booking_status: row.booking_status.parse()?,
            payment_status: row.payment_status.parse()?,
            seat_restoration: row.seat_restoration.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_bookings(rows: Vec<BookingRow>) -> RepoResult<Vec<Booking>> {
    rows.into_iter().map(Booking::try_from).collect()
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn insert_booking(&self, booking: &Booking) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, booking_reference, user_id, user_email, event_id, event_title, event_date,
                event_venue, event_time, number_of_tickets, price_per_ticket, total_amount, payment_method,
                transaction_id, booking_status, payment_status, seat_restoration, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(booking.id)
        .bind(&booking.booking_reference)
        .bind(&booking.user_id)
        .bind(booking.user_email.as_ref().map(|e| e.expose().clone()))
        .bind(&booking.event_id)
        .bind(&booking.event_title)
        .bind(booking.event_date)
        .bind(&booking.event_venue)
        .bind(&booking.event_time)
        .bind(booking.number_of_tickets)
        .bind(booking.price_per_ticket)
        .bind(booking.total_amount)
        .bind(&booking.payment_method)
        .bind(&booking.transaction_id)
        .bind(booking.booking_status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(booking.seat_restoration.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn transition_booking(&self, booking: &Booking, expected: BookingStatus) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET event_title = $2, event_date = $3, event_venue = $4, event_time = $5,
                number_of_tickets = $6, total_amount = $7, payment_method = $8, transaction_id = $9,
                booking_status = $10, payment_status = $11, seat_restoration = $12, updated_at = $13
            WHERE id = $1 AND booking_status = $14
            "#,
        )
        .bind(booking.id)
        .bind(&booking.event_title)
        .bind(booking.event_date)
        .bind(&booking.event_venue)
        .bind(&booking.event_time)
        .bind(booking.number_of_tickets)
        .bind(booking.total_amount)
        .bind(&booking.payment_method)
        .bind(&booking.transaction_id)
        .bind(booking.booking_status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(booking.seat_restoration.as_str())
        .bind(booking.updated_at)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_seat_restoration(
        &self,
        id: Uuid,
        expected: SeatRestoration,
        next: SeatRestoration,
    ) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE bookings SET seat_restoration = $3, updated_at = NOW() WHERE id = $1 AND seat_restoration = $2",
        )
        .bind(id)
        .bind(expected.as_str())
        .bind(next.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get_booking(&self, id: Uuid) -> RepoResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Booking::try_from).transpose()
    }

    async fn get_by_reference(&self, reference: &str) -> RepoResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!("SELECT {} FROM bookings WHERE booking_reference = $1", BOOKING_COLUMNS))
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Booking::try_from).transpose()
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> RepoResult<Vec<Booking>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!("SELECT {} FROM bookings WHERE TRUE", BOOKING_COLUMNS));

        if let Some(user_id) = &filter.user_id {
            query.push(" AND user_id = ").push_bind(user_id.clone());
        }
        if let Some(event_id) = &filter.event_id {
            query.push(" AND event_id = ").push_bind(event_id.clone());
        }
        if let Some(status) = filter.status {
            query.push(" AND booking_status = ").push_bind(status.as_str());
        }
        if let Some(restoration) = filter.seat_restoration {
            query.push(" AND seat_restoration = ").push_bind(restoration.as_str());
        }
        // created_at ties fall back to the time-ordered reference
        query.push(" ORDER BY created_at ASC, booking_reference ASC");

        let rows = query
            .build_query_as::<BookingRow>()
            .fetch_all(&self.pool)
            .await?;

        into_bookings(rows)
    }

    async fn cancel_all_for_event(&self, event_id: &str) -> RepoResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET booking_status = 'cancelled',
                payment_status = CASE WHEN payment_status = 'completed' THEN 'refunded' ELSE payment_status END,
                updated_at = NOW()
            WHERE event_id = $1 AND booking_status <> 'cancelled'
            "#,
        )
        .bind(event_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn sync_event_fields(&self, event_id: &str, fields: &EventFields) -> RepoResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET event_title = $2, event_date = $3, event_venue = $4, event_time = $5, updated_at = NOW()
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .bind(&fields.title)
        .bind(fields.date)
        .bind(&fields.venue)
        .bind(&fields.time)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
