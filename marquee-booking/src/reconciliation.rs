//! Retries seat restorations that failed during cancellation.
//!
//! A cancelled booking whose seats never made it back to the ledger is left
//! with `seat_restoration = pending`. The sweep re-sends the delta and, once the
//! seats are back, runs the promotion pass that cancellation skipped. When the
//! ledger no longer knows the event, the restoration is marked abandoned.

use std::collections::BTreeSet;
use std::sync::Arc;
use chrono::Utc;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};
use marquee_core::booking::SeatRestoration;
use marquee_core::ledger::{LedgerError, SeatLedger};
use marquee_core::repository::{BookingFilter, BookingRepository};

use crate::waitlist::{PromotionReport, WaitlistPromoter};

#[derive(Debug, Default)]
pub struct SweepReport {
    pub restored: usize,
    pub still_pending: usize,
    pub abandoned: usize,
    pub promotions: Vec<PromotionReport>,
}

pub struct ReconciliationSweep {
    repo: Arc<dyn BookingRepository>,
    ledger: Arc<dyn SeatLedger>,
    promoter: WaitlistPromoter,
    grace: chrono::Duration,
}

impl ReconciliationSweep {
    /// Cancellations younger than this are left alone; their own restoration
    /// may still be in flight.
    pub const DEFAULT_GRACE_SECONDS: i64 = 30;

    pub fn new(repo: Arc<dyn BookingRepository>, ledger: Arc<dyn SeatLedger>, promoter: WaitlistPromoter) -> Self {
        Self {
            repo,
            ledger,
            promoter,
            grace: chrono::Duration::seconds(Self::DEFAULT_GRACE_SECONDS),
        }
    }

    pub fn with_grace(mut self, grace: chrono::Duration) -> Self {
        self.grace = grace;
        self
    }

    pub async fn run_once(&self) -> Result<SweepReport, Box<dyn std::error::Error + Send + Sync>> {
        let cutoff = Utc::now() - self.grace;
        let owed = self.repo.list_bookings(&BookingFilter::restorations_pending()).await?;

        let mut report = SweepReport::default();
        let mut touched_events = BTreeSet::new();

        for booking in owed.into_iter().filter(|b| b.updated_at <= cutoff) {
            let delta = booking.number_of_tickets;
            match self.ledger.adjust_seats(&booking.event_id, delta).await {
                Ok(available) => {
                    let recorded = self.repo
                        .set_seat_restoration(booking.id, SeatRestoration::Pending, SeatRestoration::Restored)
                        .await;
                    if !matches!(recorded, Ok(true)) {
                        // Seats are back; a later pass would return them twice.
                        error!(booking_reference = %booking.booking_reference, "Restoration applied but not recorded: {:?}", recorded);
                    }
                    info!(booking_reference = %booking.booking_reference, event_id = %booking.event_id, delta, available, "Seats restored by sweep");
                    touched_events.insert(booking.event_id.clone());
                    report.restored += 1;
                }
                Err(LedgerError::NotFound(_)) => {
                    self.repo
                        .set_seat_restoration(booking.id, SeatRestoration::Pending, SeatRestoration::Abandoned)
                        .await?;
                    info!(booking_reference = %booking.booking_reference, event_id = %booking.event_id, "Event no longer exists, seat restoration abandoned");
                    report.abandoned += 1;
                }
                Err(e) => {
                    warn!(booking_reference = %booking.booking_reference, event_id = %booking.event_id, delta, "Restoration retry failed: {}", e);
                    report.still_pending += 1;
                }
            }
        }

        for event_id in touched_events {
            report.promotions.push(self.promoter.promote(&event_id, None).await);
        }

        Ok(report)
    }

    /// Run forever on a fixed interval.
    pub async fn run(self, interval: Duration) {
        info!(interval_secs = interval.as_secs(), "Seat reconciliation sweep started");
        loop {
            sleep(interval).await;
            match self.run_once().await {
                Ok(report) if report.restored > 0 || report.still_pending > 0 || report.abandoned > 0 => {
                    info!(
                        restored = report.restored,
                        still_pending = report.still_pending,
                        abandoned = report.abandoned,
                        "Reconciliation pass finished"
                    );
                }
                Ok(_) => {}
                Err(e) => error!("Reconciliation pass failed: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{user, Harness};
    use crate::manager::{BookingOutcome, CreateBooking};
    use marquee_core::booking::BookingStatus;

    fn sweep(h: &Harness) -> ReconciliationSweep {
        ReconciliationSweep::new(h.repo.clone(), h.ledger.clone(), h.promoter())
            .with_grace(chrono::Duration::zero())
    }

    async fn cancel_with_outage(h: &Harness, tickets: i32) -> uuid::Uuid {
        let req = CreateBooking {
            event_id: h.event_id.clone(),
            number_of_tickets: tickets,
            payment_method: "card".to_string(),
            join_waitlist: false,
        };
        let booking = match h.manager.create_booking(&user("user-x"), req).await.unwrap() {
            BookingOutcome::Confirmed(b) => b,
            other => panic!("expected confirmation, got {:?}", other),
        };
        h.ledger.fail_next_adjustments(1);
        h.manager.cancel_booking(&user("user-x"), booking.id).await.unwrap();
        booking.id
    }

    #[tokio::test]
    async fn test_sweep_restores_and_promotes() {
        let h = Harness::with_event(4, 10).await;
        let id = cancel_with_outage(&h, 4).await;
        let waiting = h.waitlist("user-y", 3).await;
        assert_eq!(h.ledger.available_seats(&h.event_id).await, Some(0));

        let report = sweep(&h).run_once().await.unwrap();

        assert_eq!(report.restored, 1);
        assert_eq!(report.promotions.len(), 1);
        assert_eq!(h.ledger.available_seats(&h.event_id).await, Some(1));

        let stored = h.repo.get_booking(id).await.unwrap().unwrap();
        assert_eq!(stored.seat_restoration, SeatRestoration::Restored);
        let promoted = h.repo.get_booking(waiting.id).await.unwrap().unwrap();
        assert_eq!(promoted.booking_status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_sweep_is_idempotent() {
        let h = Harness::with_event(2, 10).await;
        cancel_with_outage(&h, 2).await;

        sweep(&h).run_once().await.unwrap();
        let second = sweep(&h).run_once().await.unwrap();

        assert_eq!(second.restored, 0);
        assert_eq!(h.ledger.available_seats(&h.event_id).await, Some(2));
    }

    #[tokio::test]
    async fn test_failed_retry_stays_pending() {
        let h = Harness::with_event(2, 10).await;
        let id = cancel_with_outage(&h, 2).await;
        h.ledger.fail_next_adjustments(1);

        let report = sweep(&h).run_once().await.unwrap();

        assert_eq!(report.still_pending, 1);
        assert!(report.promotions.is_empty());
        let stored = h.repo.get_booking(id).await.unwrap().unwrap();
        assert_eq!(stored.seat_restoration, SeatRestoration::Pending);
    }

    #[tokio::test]
    async fn test_deleted_event_restoration_is_abandoned() {
        let h = Harness::with_event(2, 10).await;
        let id = cancel_with_outage(&h, 2).await;
        h.ledger.remove_event(&h.event_id).await;

        let report = sweep(&h).run_once().await.unwrap();
        assert_eq!(report.abandoned, 1);
        assert_eq!(report.still_pending, 0);
        assert!(report.promotions.is_empty());

        let stored = h.repo.get_booking(id).await.unwrap().unwrap();
        assert_eq!(stored.seat_restoration, SeatRestoration::Abandoned);

        let again = sweep(&h).run_once().await.unwrap();
        assert_eq!(again.abandoned, 0);
        assert_eq!(again.still_pending, 0);
    }

    #[tokio::test]
    async fn test_recent_cancellations_are_skipped() {
        let h = Harness::with_event(2, 10).await;
        cancel_with_outage(&h, 2).await;

        let report = ReconciliationSweep::new(h.repo.clone(), h.ledger.clone(), h.promoter())
            .run_once()
            .await
            .unwrap();

        assert_eq!(report.restored, 0);
        assert_eq!(report.still_pending, 0);
        assert_eq!(h.ledger.available_seats(&h.event_id).await, Some(0));
    }
}
