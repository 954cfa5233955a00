//! Waitlist promotion.
//!
//! Given an event whose seats were just freed, confirm waitlisted bookings in
//! strict arrival order. The pass stops at the first booking that does not fit
//! (head-of-line blocking): a later, smaller request is never served ahead of an
//! earlier, larger one.
//!
//! The pass holds no lock. A concurrent booking can take seats between the
//! snapshot read and each delta, so every delta is checked against the ledger,
//! and the first rejected delta ends the pass. The confirm write only lands if
//! the booking is still waitlisted; a candidate cancelled (or promoted by a
//! parallel pass) in the meantime gets its seats handed straight back.

use std::sync::Arc;
use tracing::{debug, error, info, warn};
use marquee_core::booking::{Booking, BookingStatus};
use marquee_core::ledger::SeatLedger;
use marquee_core::reference::generate_transaction_id;
use marquee_core::repository::{BookingFilter, BookingRepository};
use marquee_shared::models::events::BookingEventKind;

use crate::dispatch::NotificationDispatcher;

/// Why a promotion pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// The ledger reported no free seats.
    NoSeats,
    /// Every waitlisted booking was promoted (or there were none).
    WaitlistDrained,
    /// The next booking in line needs more seats than remain.
    Blocked {
        reference: String,
        requested: i32,
        remaining: i32,
    },
    /// The ledger refused or failed a delta; the booking stays waitlisted.
    DeltaFailed {
        reference: String,
        reason: String,
    },
    /// Seats were taken but the record could not be written.
    PersistFailed {
        reference: String,
        reason: String,
    },
    /// The snapshot or the waitlist could not be read.
    Aborted(String),
}

#[derive(Debug, Clone)]
pub struct PromotionReport {
    pub event_id: String,
    pub promoted: Vec<Booking>,
    pub outcome: PassOutcome,
}

impl PromotionReport {
    fn new(event_id: &str, outcome: PassOutcome) -> Self {
        Self {
            event_id: event_id.to_string(),
            promoted: Vec::new(),
            outcome,
        }
    }
}

#[derive(Clone)]
pub struct WaitlistPromoter {
    repo: Arc<dyn BookingRepository>,
    ledger: Arc<dyn SeatLedger>,
    notifications: NotificationDispatcher,
}

impl WaitlistPromoter {
    pub fn new(
        repo: Arc<dyn BookingRepository>,
        ledger: Arc<dyn SeatLedger>,
        notifications: NotificationDispatcher,
    ) -> Self {
        Self { repo, ledger, notifications }
    }

    /// Run one best-effort pass. Never fails: every problem ends the pass and is
    /// reported in the returned outcome.
    ///
    /// `known_available` is the count the caller just got back from the ledger,
    /// if any. The freshly fetched snapshot always wins; the hint only feeds the
    /// drift log.
    pub async fn promote(&self, event_id: &str, known_available: Option<i32>) -> PromotionReport {
        let event = match self.ledger.fetch_event(event_id).await {
            Ok(event) => event,
            Err(e) => {
                error!(event_id, "Promotion pass aborted, event lookup failed: {}", e);
                return PromotionReport::new(event_id, PassOutcome::Aborted(e.to_string()));
            }
        };

        if let Some(hint) = known_available {
            if hint != event.available_seats {
                debug!(event_id, hint, actual = event.available_seats, "Seat count moved since restoration");
            }
        }

        let mut remaining = event.available_seats;
        if remaining <= 0 {
            return PromotionReport::new(event_id, PassOutcome::NoSeats);
        }

        let waitlist = match self.repo.list_bookings(&BookingFilter::waitlist(event_id)).await {
            Ok(list) => list,
            Err(e) => {
                error!(event_id, "Promotion pass aborted, waitlist unavailable: {}", e);
                return PromotionReport::new(event_id, PassOutcome::Aborted(e.to_string()));
            }
        };

        let mut report = PromotionReport::new(event_id, PassOutcome::WaitlistDrained);

        for mut candidate in waitlist {
            let requested = candidate.number_of_tickets;
            if requested > remaining {
                info!(event_id, booking_reference = %candidate.booking_reference, requested, remaining, "Waitlist head does not fit, stopping");
                report.outcome = PassOutcome::Blocked {
                    reference: candidate.booking_reference,
                    requested,
                    remaining,
                };
                break;
            }

            if let Err(e) = self.ledger.adjust_seats(event_id, -requested).await {
                warn!(event_id, booking_reference = %candidate.booking_reference, delta = -requested, "Promotion delta failed, stopping pass: {}", e);
                report.outcome = PassOutcome::DeltaFailed {
                    reference: candidate.booking_reference,
                    reason: e.to_string(),
                };
                break;
            }

            let persisted = match candidate.confirm() {
                Ok(()) => {
                    candidate.record_payment(generate_transaction_id());
                    self.repo.transition_booking(&candidate, BookingStatus::Waitlisted).await
                }
                Err(e) => Err(e.into()),
            };

            match persisted {
                Ok(true) => {}
                Ok(false) => {
                    info!(event_id, booking_reference = %candidate.booking_reference, "Candidate left the waitlist mid-pass, returning its seats");
                    self.return_seats(event_id, requested).await;
                    continue;
                }
                Err(e) => {
                    error!(event_id, booking_reference = %candidate.booking_reference, "Promoted booking not saved, returning seats: {}", e);
                    self.return_seats(event_id, requested).await;
                    report.outcome = PassOutcome::PersistFailed {
                        reference: candidate.booking_reference,
                        reason: e.to_string(),
                    };
                    break;
                }
            }

            remaining -= requested;
            info!(event_id, booking_reference = %candidate.booking_reference, tickets = requested, remaining, "Waitlisted booking promoted");
            self.notifications.dispatch(BookingEventKind::PromotedFromWaitlist, &candidate);
            report.promoted.push(candidate);
        }

        report
    }

    async fn return_seats(&self, event_id: &str, seats: i32) {
        if let Err(undo) = self.ledger.adjust_seats(event_id, seats).await {
            error!(event_id, delta = seats, "Compensating delta failed, ledger has drifted: {}", undo);
        }
    }
}
