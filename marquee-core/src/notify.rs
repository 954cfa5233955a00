use async_trait::async_trait;
use chrono::Utc;
use marquee_shared::models::events::{BookingEventKind, BookingLifecycleEvent};

use crate::booking::Booking;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("No recipient address on booking {0}")]
    NoRecipient(String),

    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// One best-effort message about a booking transition.
#[derive(Debug, Clone)]
pub struct BookingNotification {
    pub kind: BookingEventKind,
    pub booking: Booking,
}

impl BookingNotification {
    pub fn new(kind: BookingEventKind, booking: &Booking) -> Self {
        Self {
            kind,
            booking: booking.clone(),
        }
    }

    pub fn subject(&self) -> String {
        let b = &self.booking;
        match self.kind {
            BookingEventKind::Confirmed => format!("Booking confirmed: {} ({})", b.event_title, b.booking_reference),
            BookingEventKind::Waitlisted => format!("You're on the waitlist: {} ({})", b.event_title, b.booking_reference),
            BookingEventKind::PromotedFromWaitlist => format!("Good news, your waitlisted booking is confirmed: {} ({})", b.event_title, b.booking_reference),
            BookingEventKind::Cancelled => format!("Booking cancelled: {} ({})", b.event_title, b.booking_reference),
        }
    }

    pub fn body(&self) -> String {
        let b = &self.booking;
        let mut body = format!(
            "Reference: {}\nEvent: {}\nVenue: {}\nDate: {} {}\nTickets: {}\nTotal: {:.2}\n",
            b.booking_reference,
            b.event_title,
            b.event_venue,
            b.event_date.format("%Y-%m-%d"),
            b.event_time,
            b.number_of_tickets,
            b.total_amount,
        );
        if let Some(txn) = &b.transaction_id {
            body.push_str(&format!("Transaction: {}\n", txn));
        }
        if self.kind == BookingEventKind::Cancelled {
            body.push_str(&format!("Refund amount: {:.2}\n", b.total_amount));
        }
        body
    }

    pub fn to_event(&self) -> BookingLifecycleEvent {
        let b = &self.booking;
        BookingLifecycleEvent {
            kind: self.kind,
            booking_id: b.id,
            booking_reference: b.booking_reference.clone(),
            event_id: b.event_id.clone(),
            user_id: b.user_id.clone(),
            number_of_tickets: b.number_of_tickets,
            total_amount: b.total_amount,
            transaction_id: b.transaction_id.clone(),
            timestamp: Utc::now().timestamp(),
        }
    }
}

/// Fire-and-forget sink. Failures are reported to the caller only so they can
/// be logged; they never affect a booking transition.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &BookingNotification) -> Result<(), NotifyError>;
}
