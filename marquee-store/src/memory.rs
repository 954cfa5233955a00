//! In-process adapters: a booking store, a seat ledger and a recording
//! notifier. Used by the test suites and for running the API without the
//! event service.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;
use marquee_core::booking::{Booking, BookingStatus, EventFields, PaymentStatus, SeatRestoration};
use marquee_core::ledger::{EventSnapshot, LedgerError, SeatLedger};
use marquee_core::notify::{BookingNotification, Notifier, NotifyError};
use marquee_core::repository::{BookingFilter, BookingRepository, RepoResult};
use marquee_shared::models::events::BookingEventKind;

// ============================================================================
// Booking store
// ============================================================================

/// Vec-backed store; insertion order breaks `created_at` ties.
#[derive(Default)]
pub struct InMemoryBookingRepository {
    bookings: RwLock<Vec<Booking>>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn insert_booking(&self, booking: &Booking) -> RepoResult<()> {
        let mut bookings = self.bookings.write().await;
        if bookings.iter().any(|b| b.id == booking.id || b.booking_reference == booking.booking_reference) {
            return Err(format!("Duplicate booking {}", booking.booking_reference).into());
        }
        bookings.push(booking.clone());
        Ok(())
    }

    async fn transition_booking(&self, booking: &Booking, expected: BookingStatus) -> RepoResult<bool> {
        let mut bookings = self.bookings.write().await;
        let slot = bookings
            .iter_mut()
            .find(|b| b.id == booking.id)
            .ok_or_else(|| format!("Booking {} does not exist", booking.id))?;
        if slot.booking_status != expected {
            return Ok(false);
        }
        *slot = booking.clone();
        Ok(true)
    }

    async fn set_seat_restoration(
        &self,
        id: Uuid,
        expected: SeatRestoration,
        next: SeatRestoration,
    ) -> RepoResult<bool> {
        let mut bookings = self.bookings.write().await;
        match bookings.iter_mut().find(|b| b.id == id && b.seat_restoration == expected) {
            Some(booking) => {
                booking.seat_restoration = next;
                booking.updated_at = chrono::Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_booking(&self, id: Uuid) -> RepoResult<Option<Booking>> {
        Ok(self.bookings.read().await.iter().find(|b| b.id == id).cloned())
    }

    async fn get_by_reference(&self, reference: &str) -> RepoResult<Option<Booking>> {
        Ok(self.bookings.read().await.iter().find(|b| b.booking_reference == reference).cloned())
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> RepoResult<Vec<Booking>> {
        let mut matched: Vec<Booking> = self.bookings.read().await
            .iter()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        matched.sort_by_key(|b| b.created_at);
        Ok(matched)
    }

    async fn cancel_all_for_event(&self, event_id: &str) -> RepoResult<u64> {
        let mut bookings = self.bookings.write().await;
        let mut touched = 0;
        for booking in bookings.iter_mut().filter(|b| b.event_id == event_id && b.booking_status != BookingStatus::Cancelled) {
            booking.booking_status = BookingStatus::Cancelled;
            if booking.payment_status == PaymentStatus::Completed {
                booking.payment_status = PaymentStatus::Refunded;
            }
            booking.updated_at = chrono::Utc::now();
            touched += 1;
        }
        Ok(touched)
    }

    async fn sync_event_fields(&self, event_id: &str, fields: &EventFields) -> RepoResult<u64> {
        let mut bookings = self.bookings.write().await;
        let mut touched = 0;
        for booking in bookings.iter_mut().filter(|b| b.event_id == event_id) {
            booking.apply_event_fields(fields);
            touched += 1;
        }
        Ok(touched)
    }
}

// ============================================================================
// Seat ledger
// ============================================================================

/// Ledger that enforces `0 <= available_seats <= capacity` on every adjustment.
#[derive(Default)]
pub struct InMemorySeatLedger {
    events: RwLock<HashMap<String, EventSnapshot>>,
    adjustments: RwLock<Vec<(String, i32)>>,
    failing_adjustments: AtomicUsize,
    failing_lookups: AtomicUsize,
}

impl InMemorySeatLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_event(&self, event: EventSnapshot) {
        self.events.write().await.insert(event.id.clone(), event);
    }

    /// Drop an event, as the event service does when it deletes one.
    pub async fn remove_event(&self, event_id: &str) {
        self.events.write().await.remove(event_id);
    }

    pub async fn get(&self, event_id: &str) -> Option<EventSnapshot> {
        self.events.read().await.get(event_id).cloned()
    }

    pub async fn available_seats(&self, event_id: &str) -> Option<i32> {
        self.get(event_id).await.map(|e| e.available_seats)
    }

    /// Every accepted delta, in order.
    pub async fn adjustments(&self) -> Vec<(String, i32)> {
        self.adjustments.read().await.clone()
    }

    /// Make the next `count` adjustment calls fail as if the ledger were down.
    pub fn fail_next_adjustments(&self, count: usize) {
        self.failing_adjustments.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` event lookups fail as if the ledger were down.
    pub fn fail_next_lookups(&self, count: usize) {
        self.failing_lookups.store(count, Ordering::SeqCst);
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl SeatLedger for InMemorySeatLedger {
    async fn fetch_event(&self, event_id: &str) -> Result<EventSnapshot, LedgerError> {
        if Self::take_failure(&self.failing_lookups) {
            return Err(LedgerError::Unavailable("simulated outage".to_string()));
        }
        self.get(event_id)
            .await
            .ok_or_else(|| LedgerError::NotFound(event_id.to_string()))
    }

    async fn adjust_seats(&self, event_id: &str, delta: i32) -> Result<i32, LedgerError> {
        if Self::take_failure(&self.failing_adjustments) {
            return Err(LedgerError::Unavailable("simulated outage".to_string()));
        }

        let mut events = self.events.write().await;
        let event = events
            .get_mut(event_id)
            .ok_or_else(|| LedgerError::NotFound(event_id.to_string()))?;

        let next = event.available_seats + delta;
        if next < 0 || next > event.capacity {
            return Err(LedgerError::Rejected {
                status: 400,
                message: format!(
                    "Adjustment {} would move available seats from {} outside [0, {}]",
                    delta, event.available_seats, event.capacity
                ),
            });
        }

        event.available_seats = next;
        self.adjustments.write().await.push((event_id.to_string(), delta));
        Ok(next)
    }
}

// ============================================================================
// Notifier
// ============================================================================

/// Keeps every notification it receives; optionally fails them all.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: RwLock<Vec<(BookingEventKind, String)>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: RwLock::new(Vec::new()),
            fail: true,
        }
    }

    /// (kind, booking reference) pairs in delivery order.
    pub async fn sent(&self) -> Vec<(BookingEventKind, String)> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &BookingNotification) -> Result<(), NotifyError> {
        self.sent
            .write()
            .await
            .push((notification.kind, notification.booking.booking_reference.clone()));
        if self.fail {
            return Err(NotifyError::Delivery("simulated failure".to_string()));
        }
        Ok(())
    }
}
