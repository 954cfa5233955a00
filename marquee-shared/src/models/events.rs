use uuid::Uuid;

/// Lifecycle kinds published to the booking events topic.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingEventKind {
    Confirmed,
    Waitlisted,
    PromotedFromWaitlist,
    Cancelled,
}

impl BookingEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingEventKind::Confirmed => "booking.confirmed",
            BookingEventKind::Waitlisted => "booking.waitlisted",
            BookingEventKind::PromotedFromWaitlist => "booking.promoted",
            BookingEventKind::Cancelled => "booking.cancelled",
        }
    }
}

/// Payload published for every booking state transition. Consumers (the email
/// worker, the event service's reporting) must tolerate duplicates and gaps.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BookingLifecycleEvent {
    pub kind: BookingEventKind,
    pub booking_id: Uuid,
    pub booking_reference: String,
    pub event_id: String,
    pub user_id: String,
    pub number_of_tickets: i32,
    pub total_amount: f64,
    pub transaction_id: Option<String>,
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let event = BookingLifecycleEvent {
            kind: BookingEventKind::PromotedFromWaitlist,
            booking_id: Uuid::nil(),
            booking_reference: "BKREF".to_string(),
            event_id: "evt-1".to_string(),
            user_id: "user-1".to_string(),
            number_of_tickets: 2,
            total_amount: 50.0,
            transaction_id: Some("TXN1".to_string()),
            timestamp: 0,
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["kind"], "PROMOTED_FROM_WAITLIST");
        assert_eq!(value["bookingReference"], "BKREF");
        assert_eq!(value["numberOfTickets"], 2);
        assert_eq!(BookingEventKind::Cancelled.as_str(), "booking.cancelled");
    }
}
