//! Shared fixtures for the engine tests.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;
use marquee_core::booking::{Booking, BookingStatus, EventFields, SeatRestoration};
use marquee_core::identity::{Caller, Role};
use marquee_core::ledger::{EventSnapshot, EventStatus};
use marquee_core::payment::{PaymentGateway, PaymentOutcome, PaymentRequest};
use marquee_core::reference::generate_booking_reference;
use marquee_core::repository::{BookingFilter, BookingRepository, RepoResult};
use marquee_store::memory::{InMemoryBookingRepository, InMemorySeatLedger, RecordingNotifier};

use crate::dispatch::NotificationDispatcher;
use crate::manager::BookingManager;
use crate::waitlist::WaitlistPromoter;

/// Plays back queued outcomes, then approves everything.
#[derive(Default)]
pub struct ScriptedPayments {
    script: Mutex<VecDeque<PaymentOutcome>>,
}

impl ScriptedPayments {
    pub fn push(&self, outcome: PaymentOutcome) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(outcome);
        }
    }
}

#[async_trait]
impl PaymentGateway for ScriptedPayments {
    async fn charge(
        &self,
        _request: &PaymentRequest,
    ) -> Result<PaymentOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        Ok(next.unwrap_or(PaymentOutcome::Succeeded))
    }
}

/// Wraps the in-memory store with write failures and an optional yield after
/// every single-booking read, so two tasks can interleave read-then-write.
pub struct FlakyRepository {
    inner: Arc<InMemoryBookingRepository>,
    yield_after_reads: AtomicBool,
    failing_inserts: AtomicUsize,
    failing_transitions: AtomicUsize,
}

impl FlakyRepository {
    pub fn new(inner: Arc<InMemoryBookingRepository>) -> Self {
        Self {
            inner,
            yield_after_reads: AtomicBool::new(false),
            failing_inserts: AtomicUsize::new(0),
            failing_transitions: AtomicUsize::new(0),
        }
    }

    pub fn yield_after_reads(&self) {
        self.yield_after_reads.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_inserts(&self, count: usize) {
        self.failing_inserts.store(count, Ordering::SeqCst);
    }

    pub fn fail_next_transitions(&self, count: usize) {
        self.failing_transitions.store(count, Ordering::SeqCst);
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl BookingRepository for FlakyRepository {
    async fn insert_booking(&self, booking: &Booking) -> RepoResult<()> {
        if Self::take_failure(&self.failing_inserts) {
            return Err("simulated insert failure".into());
        }
        self.inner.insert_booking(booking).await
    }

    async fn transition_booking(&self, booking: &Booking, expected: BookingStatus) -> RepoResult<bool> {
        if Self::take_failure(&self.failing_transitions) {
            return Err("simulated write failure".into());
        }
        self.inner.transition_booking(booking, expected).await
    }

    async fn set_seat_restoration(
        &self,
        id: Uuid,
        expected: SeatRestoration,
        next: SeatRestoration,
    ) -> RepoResult<bool> {
        self.inner.set_seat_restoration(id, expected, next).await
    }

    async fn get_booking(&self, id: Uuid) -> RepoResult<Option<Booking>> {
        let found = self.inner.get_booking(id).await;
        if self.yield_after_reads.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        found
    }

    async fn get_by_reference(&self, reference: &str) -> RepoResult<Option<Booking>> {
        self.inner.get_by_reference(reference).await
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> RepoResult<Vec<Booking>> {
        self.inner.list_bookings(filter).await
    }

    async fn cancel_all_for_event(&self, event_id: &str) -> RepoResult<u64> {
        self.inner.cancel_all_for_event(event_id).await
    }

    async fn sync_event_fields(&self, event_id: &str, fields: &EventFields) -> RepoResult<u64> {
        self.inner.sync_event_fields(event_id, fields).await
    }
}

pub struct Harness {
    pub event_id: String,
    pub repo: Arc<InMemoryBookingRepository>,
    pub ledger: Arc<InMemorySeatLedger>,
    pub notifier: Arc<RecordingNotifier>,
    pub payments: Arc<ScriptedPayments>,
    pub manager: BookingManager,
}

pub fn event(id: &str, available: i32, capacity: i32) -> EventSnapshot {
    EventSnapshot {
        id: id.to_string(),
        title: "Evening Concert".to_string(),
        date: Utc::now() + Duration::days(7),
        venue: "Riverside Hall".to_string(),
        time: "19:30".to_string(),
        price: 25.0,
        status: EventStatus::Active,
        available_seats: available,
        capacity,
    }
}

pub fn user(id: &str) -> Caller {
    Caller::new(id, Some(format!("{}@example.com", id)), Role::User)
}

pub fn admin() -> Caller {
    Caller::new("admin-1", None, Role::Admin)
}

impl Harness {
    pub async fn with_event(available: i32, capacity: i32) -> Self {
        let repo = Arc::new(InMemoryBookingRepository::new());
        let ledger = Arc::new(InMemorySeatLedger::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let payments = Arc::new(ScriptedPayments::default());

        let event_id = "evt-1".to_string();
        ledger.register_event(event(&event_id, available, capacity)).await;

        let manager = BookingManager::new(repo.clone(), ledger.clone(), payments.clone(), notifier.clone());

        Self { event_id, repo, ledger, notifier, payments, manager }
    }

    /// A manager over `repo` sharing this harness's ledger, payments and notifier.
    pub fn manager_with(&self, repo: Arc<dyn BookingRepository>) -> BookingManager {
        BookingManager::new(repo, self.ledger.clone(), self.payments.clone(), self.notifier.clone())
    }

    /// The harness repository wrapped for fault injection.
    pub fn flaky_repo(&self) -> Arc<FlakyRepository> {
        Arc::new(FlakyRepository::new(self.repo.clone()))
    }

    pub fn promoter(&self) -> WaitlistPromoter {
        WaitlistPromoter::new(
            self.repo.clone(),
            self.ledger.clone(),
            NotificationDispatcher::new(self.notifier.clone()),
        )
    }

    /// Store a waitlisted booking directly, one millisecond after the last one.
    pub async fn waitlist(&self, user_id: &str, tickets: i32) -> Booking {
        let snapshot = event(&self.event_id, 0, 0);
        let mut booking = Booking::new(generate_booking_reference(), &user(user_id), &snapshot, tickets, "card".to_string());
        booking.mark_waitlisted();

        let existing = self.repo.list_bookings(&Default::default()).await.unwrap_or_default();
        if let Some(last) = existing.iter().map(|b| b.created_at).max() {
            booking.created_at = last + Duration::milliseconds(1);
        }

        self.repo.insert_booking(&booking).await.unwrap();
        booking
    }

    /// Let spawned notification tasks run.
    pub async fn settle(&self) {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
}
