use async_trait::async_trait;
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus, EventFields, SeatRestoration};

pub type RepoResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Selection for `list_bookings`. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub user_id: Option<String>,
    pub event_id: Option<String>,
    pub status: Option<BookingStatus>,
    pub seat_restoration: Option<SeatRestoration>,
}

impl BookingFilter {
    pub fn for_user(user_id: &str) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            ..Default::default()
        }
    }

    pub fn for_event(event_id: &str) -> Self {
        Self {
            event_id: Some(event_id.to_string()),
            ..Default::default()
        }
    }

    pub fn waitlist(event_id: &str) -> Self {
        Self::for_event(event_id).with_status(BookingStatus::Waitlisted)
    }

    pub fn restorations_pending() -> Self {
        Self {
            seat_restoration: Some(SeatRestoration::Pending),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        self.user_id.as_deref().map_or(true, |u| booking.user_id == u)
            && self.event_id.as_deref().map_or(true, |e| booking.event_id == e)
            && self.status.map_or(true, |s| booking.booking_status == s)
            && self.seat_restoration.map_or(true, |r| booking.seat_restoration == r)
    }
}

/// Durable booking records.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert_booking(&self, booking: &Booking) -> RepoResult<()>;

    /// Overwrite a stored booking, but only while its stored status is still
    /// `expected`. Returns `false` when another writer moved it first.
    async fn transition_booking(&self, booking: &Booking, expected: BookingStatus) -> RepoResult<bool>;

    /// Compare-and-set on the seat restoration marker alone.
    async fn set_seat_restoration(
        &self,
        id: Uuid,
        expected: SeatRestoration,
        next: SeatRestoration,
    ) -> RepoResult<bool>;

    async fn get_booking(&self, id: Uuid) -> RepoResult<Option<Booking>>;

    async fn get_by_reference(&self, reference: &str) -> RepoResult<Option<Booking>>;

    /// Bookings matching the filter, oldest `created_at` first.
    async fn list_bookings(&self, filter: &BookingFilter) -> RepoResult<Vec<Booking>>;

    /// Flip every non-cancelled booking of the event to cancelled (payment
    /// refunded where it was completed). No seat bookkeeping. Returns rows touched.
    async fn cancel_all_for_event(&self, event_id: &str) -> RepoResult<u64>;

    /// Overwrite the denormalized event fields on every booking of the event.
    async fn sync_event_fields(&self, event_id: &str, fields: &EventFields) -> RepoResult<u64>;
}
