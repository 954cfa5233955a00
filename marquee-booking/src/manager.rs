use std::sync::Arc;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use marquee_core::analytics::BookingAnalytics;
use marquee_core::booking::{Booking, BookingStatus, EventFields, SeatRestoration};
use marquee_core::identity::Caller;
use marquee_core::ledger::{EventStatus, LedgerError, SeatLedger};
use marquee_core::notify::Notifier;
use marquee_core::payment::{PaymentGateway, PaymentOutcome, PaymentRequest};
use marquee_core::reference::{generate_booking_reference, generate_transaction_id};
use marquee_core::repository::{BookingFilter, BookingRepository};
use marquee_shared::models::events::BookingEventKind;

use crate::dispatch::NotificationDispatcher;
use crate::error::BookingError;
use crate::waitlist::{PromotionReport, WaitlistPromoter};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBooking {
    pub event_id: String,
    pub number_of_tickets: i32,
    pub payment_method: String,
    #[serde(default)]
    pub join_waitlist: bool,
}

#[derive(Debug, Clone)]
pub enum BookingOutcome {
    Confirmed(Booking),
    Waitlisted(Booking),
}

impl BookingOutcome {
    pub fn booking(&self) -> &Booking {
        match self {
            BookingOutcome::Confirmed(b) | BookingOutcome::Waitlisted(b) => b,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cancellation {
    pub booking: Booking,
    pub refund_amount: f64,
    /// Availability reported by the ledger after the seats came back.
    pub seats_available: Option<i32>,
    /// Present only when seats were restored and a promotion pass ran.
    pub promotion: Option<PromotionReport>,
}

/// Drives bookings through their lifecycle against the event service's seat
/// ledger. Holds no locks: every seat decision is finally made by the ledger.
pub struct BookingManager {
    repo: Arc<dyn BookingRepository>,
    ledger: Arc<dyn SeatLedger>,
    payments: Arc<dyn PaymentGateway>,
    notifications: NotificationDispatcher,
    promoter: WaitlistPromoter,
}

impl BookingManager {
    pub fn new(
        repo: Arc<dyn BookingRepository>,
        ledger: Arc<dyn SeatLedger>,
        payments: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let notifications = NotificationDispatcher::new(notifier);
        let promoter = WaitlistPromoter::new(repo.clone(), ledger.clone(), notifications.clone());
        Self {
            repo,
            ledger,
            payments,
            notifications,
            promoter,
        }
    }

    pub fn promoter(&self) -> &WaitlistPromoter {
        &self.promoter
    }

    // ========================================================================
    // Create
    // ========================================================================

    pub async fn create_booking(&self, caller: &Caller, req: CreateBooking) -> Result<BookingOutcome, BookingError> {
        if req.number_of_tickets <= 0 {
            return Err(BookingError::Validation("numberOfTickets must be a positive integer".to_string()));
        }
        if req.payment_method.trim().is_empty() {
            return Err(BookingError::Validation("paymentMethod is required".to_string()));
        }

        // Any lookup failure is reported as a missing event
        let event = self.ledger.fetch_event(&req.event_id).await.map_err(|e| {
            if !matches!(e, LedgerError::NotFound(_)) {
                warn!(event_id = %req.event_id, "Event lookup failed: {}", e);
            }
            BookingError::NotFound(format!("Event {}", req.event_id))
        })?;

        if event.status == EventStatus::Cancelled {
            return Err(BookingError::Validation("Event has been cancelled".to_string()));
        }
        if event.date < Utc::now() {
            return Err(BookingError::Validation("Event has already taken place".to_string()));
        }

        let should_waitlist = event.available_seats < req.number_of_tickets;
        if should_waitlist && !req.join_waitlist {
            return Err(BookingError::InsufficientSeats {
                available: event.available_seats,
                requested: req.number_of_tickets,
            });
        }

        let mut booking = Booking::new(
            generate_booking_reference(),
            caller,
            &event,
            req.number_of_tickets,
            req.payment_method,
        );

        if should_waitlist {
            booking.mark_waitlisted();
            self.repo.insert_booking(&booking).await?;
            info!(booking_reference = %booking.booking_reference, event_id = %booking.event_id, tickets = booking.number_of_tickets, "Booking waitlisted");
            self.notifications.dispatch(BookingEventKind::Waitlisted, &booking);
            return Ok(BookingOutcome::Waitlisted(booking));
        }

        let payment = PaymentRequest {
            booking_reference: booking.booking_reference.clone(),
            amount: booking.total_amount,
            payment_method: booking.payment_method.clone(),
        };
        let outcome = self.payments.charge(&payment).await.unwrap_or_else(|e| {
            warn!(booking_reference = %booking.booking_reference, "Payment gateway error, treating as declined: {}", e);
            PaymentOutcome::Declined
        });

        if outcome == PaymentOutcome::Declined {
            booking.mark_payment_failed();
            self.repo.insert_booking(&booking).await?;
            info!(booking_reference = %booking.booking_reference, "Payment declined, booking left pending");
            return Err(BookingError::PaymentFailed {
                reference: booking.booking_reference,
            });
        }

        booking.record_payment(generate_transaction_id());
        let delta = -booking.number_of_tickets;

        if let Err(e) = self.ledger.adjust_seats(&booking.event_id, delta).await {
            error!(booking_reference = %booking.booking_reference, event_id = %booking.event_id, delta, "Seat delta failed after payment: {}", e);
            booking.reverse_payment();
            if let Err(store_err) = self.repo.insert_booking(&booking).await {
                error!(booking_reference = %booking.booking_reference, "Could not record reversed booking: {}", store_err);
            }
            return Err(BookingError::InventoryUpdateFailed {
                reference: booking.booking_reference,
                source: e,
            });
        }

        booking.confirm()?;
        if let Err(e) = self.repo.insert_booking(&booking).await {
            error!(booking_reference = %booking.booking_reference, "Confirmed booking not saved, returning seats: {}", e);
            if let Err(undo) = self.ledger.adjust_seats(&booking.event_id, -delta).await {
                error!(event_id = %booking.event_id, delta = -delta, "Compensating delta failed, ledger has drifted: {}", undo);
            }
            return Err(e.into());
        }

        info!(booking_reference = %booking.booking_reference, event_id = %booking.event_id, tickets = booking.number_of_tickets, "Booking confirmed");
        self.notifications.dispatch(BookingEventKind::Confirmed, &booking);
        Ok(BookingOutcome::Confirmed(booking))
    }

    // ========================================================================
    // Cancel
    // ========================================================================

    pub async fn cancel_booking(&self, caller: &Caller, booking_id: Uuid) -> Result<Cancellation, BookingError> {
        let mut booking = self.load_authorized(caller, booking_id).await?;

        // A lost write means someone else moved the booking; re-read and re-check.
        let owed = loop {
            if booking.booking_status == BookingStatus::Cancelled {
                return Err(BookingError::AlreadyCancelled(booking.booking_reference));
            }
            if booking.event_has_passed(Utc::now()) {
                return Err(BookingError::EventAlreadyPassed(booking.booking_reference));
            }

            let from = booking.booking_status;
            let owed = booking.cancel()?;
            if self.repo.transition_booking(&booking, from).await? {
                break owed;
            }

            debug!(booking_reference = %booking.booking_reference, from = %from, "Booking changed underneath cancellation, retrying");
            booking = self.load_authorized(caller, booking_id).await?;
        };
        info!(booking_reference = %booking.booking_reference, seats_owed = owed, "Booking cancelled");

        let mut seats_available = None;
        let mut promotion = None;

        if owed > 0 {
            match self.ledger.adjust_seats(&booking.event_id, owed).await {
                Ok(available) => {
                    booking.mark_seats_restored();
                    let recorded = self.repo
                        .set_seat_restoration(booking.id, SeatRestoration::Pending, SeatRestoration::Restored)
                        .await;
                    if !matches!(recorded, Ok(true)) {
                        error!(booking_reference = %booking.booking_reference, "Seats restored but restoration not recorded: {:?}", recorded);
                    }
                    seats_available = Some(available);
                    promotion = Some(self.promoter.promote(&booking.event_id, Some(available)).await);
                }
                Err(e) => {
                    // Left pending for the reconciliation sweep; no promotion this time.
                    warn!(booking_reference = %booking.booking_reference, event_id = %booking.event_id, delta = owed, "Seat restoration failed: {}", e);
                }
            }
        }

        self.notifications.dispatch(BookingEventKind::Cancelled, &booking);

        Ok(Cancellation {
            refund_amount: booking.total_amount,
            booking,
            seats_available,
            promotion,
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// The caller's bookings, newest first.
    pub async fn list_my_bookings(&self, caller: &Caller, status: Option<BookingStatus>) -> Result<Vec<Booking>, BookingError> {
        let mut filter = BookingFilter::for_user(&caller.user_id);
        filter.status = status;
        let mut bookings = self.repo.list_bookings(&filter).await?;
        bookings.reverse();
        Ok(bookings)
    }

    pub async fn get_booking(&self, caller: &Caller, booking_id: Uuid) -> Result<Booking, BookingError> {
        self.load_authorized(caller, booking_id).await
    }

    pub async fn get_booking_by_reference(&self, caller: &Caller, reference: &str) -> Result<Booking, BookingError> {
        let booking = self.repo
            .get_by_reference(reference)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Booking {}", reference)))?;
        authorize(caller, &booking)?;
        Ok(booking)
    }

    pub async fn list_event_bookings(
        &self,
        caller: &Caller,
        event_id: &str,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, BookingError> {
        require_admin(caller)?;
        let mut filter = BookingFilter::for_event(event_id);
        filter.status = status;
        Ok(self.repo.list_bookings(&filter).await?)
    }

    pub async fn analytics(&self, caller: &Caller, event_id: Option<&str>) -> Result<BookingAnalytics, BookingError> {
        require_admin(caller)?;
        let filter = event_id.map(BookingFilter::for_event).unwrap_or_default();
        let bookings = self.repo.list_bookings(&filter).await?;
        Ok(BookingAnalytics::from_bookings(&bookings))
    }

    // ========================================================================
    // Maintenance calls from the event service
    // ========================================================================

    /// Retire every booking of an event. Seats are not handed back one by one
    /// and no promotion runs: the event itself is going away.
    pub async fn cancel_all_for_event(&self, event_id: &str) -> Result<u64, BookingError> {
        let cancelled = self.repo.cancel_all_for_event(event_id).await?;
        info!(event_id, cancelled, "Bulk-cancelled bookings for retired event");
        Ok(cancelled)
    }

    pub async fn sync_event_fields(&self, event_id: &str, fields: &EventFields) -> Result<u64, BookingError> {
        let updated = self.repo.sync_event_fields(event_id, fields).await?;
        info!(event_id, updated, "Event snapshot re-synced onto bookings");
        Ok(updated)
    }

    async fn load_authorized(&self, caller: &Caller, booking_id: Uuid) -> Result<Booking, BookingError> {
        let booking = self.repo
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Booking {}", booking_id)))?;
        authorize(caller, &booking)?;
        Ok(booking)
    }
}

fn authorize(caller: &Caller, booking: &Booking) -> Result<(), BookingError> {
    if booking.is_owned_by(caller) || caller.is_admin() {
        Ok(())
    } else {
        Err(BookingError::Forbidden("Booking belongs to another user".to_string()))
    }
}

fn require_admin(caller: &Caller) -> Result<(), BookingError> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(BookingError::Forbidden("Admin role required".to_string()))
    }
}
