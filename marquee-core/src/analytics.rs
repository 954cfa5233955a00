use serde::Serialize;
use std::collections::BTreeMap;

use crate::booking::{Booking, BookingStatus, PaymentStatus};

/// Admin summary over a set of bookings.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingAnalytics {
    pub total_bookings: usize,
    pub by_booking_status: BTreeMap<String, usize>,
    pub by_payment_status: BTreeMap<String, usize>,
    pub tickets_sold: i64,
    pub waitlisted_tickets: i64,
    pub gross_revenue: f64,
    pub refunded_amount: f64,
}

impl BookingAnalytics {
    pub fn from_bookings<'a>(bookings: impl IntoIterator<Item = &'a Booking>) -> Self {
        let mut summary = Self::default();

        for status in ["pending", "confirmed", "waitlisted", "cancelled"] {
            summary.by_booking_status.insert(status.to_string(), 0);
        }
        for status in ["pending", "completed", "failed", "refunded"] {
            summary.by_payment_status.insert(status.to_string(), 0);
        }

        for booking in bookings {
            summary.total_bookings += 1;
            *summary.by_booking_status.entry(booking.booking_status.to_string()).or_default() += 1;
            *summary.by_payment_status.entry(booking.payment_status.to_string()).or_default() += 1;

            match booking.booking_status {
                BookingStatus::Confirmed => summary.tickets_sold += i64::from(booking.number_of_tickets),
                BookingStatus::Waitlisted => summary.waitlisted_tickets += i64::from(booking.number_of_tickets),
                _ => {}
            }

            match booking.payment_status {
                PaymentStatus::Completed => summary.gross_revenue += booking.total_amount,
                PaymentStatus::Refunded => summary.refunded_amount += booking.total_amount,
                _ => {}
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Caller, Role};
    use crate::ledger::{EventSnapshot, EventStatus};
    use chrono::Utc;

    fn booking(tickets: i32) -> Booking {
        let event = EventSnapshot {
            id: "evt-1".to_string(),
            title: "Show".to_string(),
            date: Utc::now(),
            venue: "Hall".to_string(),
            time: "19:00".to_string(),
            price: 10.0,
            status: EventStatus::Active,
            available_seats: 100,
            capacity: 100,
        };
        let caller = Caller::new("u1", None, Role::User);
        Booking::new("BK".to_string(), &caller, &event, tickets, "card".to_string())
    }

    #[test]
    fn test_summary_counts() {
        let mut confirmed = booking(2);
        confirmed.record_payment("TXN".to_string());
        confirmed.confirm().unwrap();

        let mut waitlisted = booking(3);
        waitlisted.mark_waitlisted();

        let mut cancelled = booking(1);
        cancelled.record_payment("TXN".to_string());
        cancelled.confirm().unwrap();
        cancelled.cancel().unwrap();

        let summary = BookingAnalytics::from_bookings(&[confirmed, waitlisted, cancelled]);
        assert_eq!(summary.total_bookings, 3);
        assert_eq!(summary.by_booking_status["confirmed"], 1);
        assert_eq!(summary.by_booking_status["pending"], 0);
        assert_eq!(summary.by_payment_status["refunded"], 1);
        assert_eq!(summary.tickets_sold, 2);
        assert_eq!(summary.waitlisted_tickets, 3);
        assert_eq!(summary.gross_revenue, 20.0);
        assert_eq!(summary.refunded_amount, 10.0);
    }
}
