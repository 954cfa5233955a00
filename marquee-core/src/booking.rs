use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use marquee_shared::Masked;

use crate::identity::Caller;
use crate::ledger::EventSnapshot;

/// Booking status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Waitlisted,
    Cancelled,
}

/// Payment status, tracked independently of the booking status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// Whether seats consumed by this booking still have to be handed back to the ledger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SeatRestoration {
    NotOwed,
    Pending,
    Restored,
    /// The event is gone from the ledger; nothing left to return seats to.
    Abandoned,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Waitlisted => "waitlisted",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl SeatRestoration {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatRestoration::NotOwed => "not_owed",
            SeatRestoration::Pending => "pending",
            SeatRestoration::Restored => "restored",
            SeatRestoration::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown status value: {0}")]
pub struct UnknownStatus(pub String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid booking transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: BookingStatus,
    pub to: BookingStatus,
}

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "waitlisted" => Ok(BookingStatus::Waitlisted),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl FromStr for SeatRestoration {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_owed" => Ok(SeatRestoration::NotOwed),
            "pending" => Ok(SeatRestoration::Pending),
            "restored" => Ok(SeatRestoration::Restored),
            "abandoned" => Ok(SeatRestoration::Abandoned),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Denormalized event fields copied onto each booking. Re-synced by the event
/// service, so they may be stale between syncs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventFields {
    pub title: String,
    pub date: DateTime<Utc>,
    pub venue: String,
    pub time: String,
}

/// A ticket reservation against an event's seat pool. Never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub booking_reference: String,
    pub user_id: String,
    pub user_email: Option<Masked<String>>,
    pub event_id: String,
    pub event_title: String,
    pub event_date: DateTime<Utc>,
    pub event_venue: String,
    pub event_time: String,
    pub number_of_tickets: i32,
    pub price_per_ticket: f64,
    pub total_amount: f64,
    pub payment_method: String,
    pub transaction_id: Option<String>,
    pub booking_status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub seat_restoration: SeatRestoration,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Build a fresh `pending` booking with the event snapshot copied in.
    pub fn new(
        booking_reference: String,
        caller: &Caller,
        event: &EventSnapshot,
        number_of_tickets: i32,
        payment_method: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            booking_reference,
            user_id: caller.user_id.clone(),
            user_email: caller.email.clone().map(Masked),
            event_id: event.id.clone(),
            event_title: event.title.clone(),
            event_date: event.date,
            event_venue: event.venue.clone(),
            event_time: event.time.clone(),
            number_of_tickets,
            price_per_ticket: event.price,
            total_amount: f64::from(number_of_tickets) * event.price,
            payment_method,
            transaction_id: None,
            booking_status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            seat_restoration: SeatRestoration::NotOwed,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark_waitlisted(&mut self) {
        self.booking_status = BookingStatus::Waitlisted;
        self.payment_status = PaymentStatus::Pending;
        self.touch();
    }

    pub fn mark_payment_failed(&mut self) {
        self.booking_status = BookingStatus::Pending;
        self.payment_status = PaymentStatus::Failed;
        self.touch();
    }

    /// Record a completed payment. The booking is not confirmed until the
    /// ledger has accepted the seat delta.
    pub fn record_payment(&mut self, transaction_id: String) {
        self.payment_status = PaymentStatus::Completed;
        self.transaction_id = Some(transaction_id);
        self.touch();
    }

    /// Payment went through but the seats could not be taken: reverse it.
    pub fn reverse_payment(&mut self) {
        self.booking_status = BookingStatus::Pending;
        self.payment_status = PaymentStatus::Refunded;
        self.touch();
    }

    /// Transition: Pending | Waitlisted → Confirmed
    pub fn confirm(&mut self) -> Result<(), InvalidTransition> {
        if !matches!(self.booking_status, BookingStatus::Pending | BookingStatus::Waitlisted) {
            return Err(self.invalid(BookingStatus::Confirmed));
        }
        self.booking_status = BookingStatus::Confirmed;
        self.touch();
        Ok(())
    }

    /// Move to `cancelled` (terminal). Returns the number of seats owed back to
    /// the ledger, non-zero only when the booking had been confirmed.
    pub fn cancel(&mut self) -> Result<i32, InvalidTransition> {
        if self.booking_status == BookingStatus::Cancelled {
            return Err(self.invalid(BookingStatus::Cancelled));
        }
        let was_confirmed = self.booking_status == BookingStatus::Confirmed;
        self.booking_status = BookingStatus::Cancelled;
        if self.payment_status == PaymentStatus::Completed {
            self.payment_status = PaymentStatus::Refunded;
        }
        self.touch();

        if was_confirmed {
            self.seat_restoration = SeatRestoration::Pending;
            Ok(self.number_of_tickets)
        } else {
            Ok(0)
        }
    }

    pub fn mark_seats_restored(&mut self) {
        self.seat_restoration = SeatRestoration::Restored;
        self.touch();
    }

    fn invalid(&self, to: BookingStatus) -> InvalidTransition {
        InvalidTransition {
            from: self.booking_status,
            to,
        }
    }

    pub fn apply_event_fields(&mut self, fields: &EventFields) {
        self.event_title = fields.title.clone();
        self.event_date = fields.date;
        self.event_venue = fields.venue.clone();
        self.event_time = fields.time.clone();
        self.touch();
    }

    pub fn is_owned_by(&self, caller: &Caller) -> bool {
        self.user_id == caller.user_id
    }

    pub fn event_has_passed(&self, now: DateTime<Utc>) -> bool {
        self.event_date < now
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
