use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};
use marquee_core::notify::{BookingNotification, Notifier, NotifyError};

/// Used when no delivery channel is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &BookingNotification) -> Result<(), NotifyError> {
        info!(
            kind = notification.kind.as_str(),
            booking_reference = %notification.booking.booking_reference,
            "{}",
            notification.subject()
        );
        Ok(())
    }
}

/// Delivers to every inner sink; one failing sink does not stop the others.
pub struct FanoutNotifier {
    sinks: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new(sinks: Vec<Arc<dyn Notifier>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl Notifier for FanoutNotifier {
    async fn notify(&self, notification: &BookingNotification) -> Result<(), NotifyError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.notify(notification).await {
                warn!(booking_reference = %notification.booking.booking_reference, "Notification sink failed: {}", e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::RecordingNotifier;
    use chrono::Utc;
    use marquee_core::booking::Booking;
    use marquee_core::identity::{Caller, Role};
    use marquee_core::ledger::{EventSnapshot, EventStatus};
    use marquee_shared::models::events::BookingEventKind;

    fn notification() -> BookingNotification {
        let event = EventSnapshot {
            id: "evt-1".to_string(),
            title: "Show".to_string(),
            date: Utc::now(),
            venue: "Hall".to_string(),
            time: "19:00".to_string(),
            price: 10.0,
            status: EventStatus::Active,
            available_seats: 1,
            capacity: 1,
        };
        let booking = Booking::new("BKX".to_string(), &Caller::new("u1", None, Role::User), &event, 1, "card".to_string());
        BookingNotification::new(BookingEventKind::Confirmed, &booking)
    }

    #[tokio::test]
    async fn test_fanout_reaches_all_sinks_despite_failure() {
        let failing = Arc::new(RecordingNotifier::failing());
        let healthy = Arc::new(RecordingNotifier::new());
        let fanout = FanoutNotifier::new(vec![failing.clone(), healthy.clone()]);

        assert!(fanout.notify(&notification()).await.is_err());
        assert_eq!(healthy.sent().await, vec![(BookingEventKind::Confirmed, "BKX".to_string())]);
        assert_eq!(failing.sent().await.len(), 1);
    }
}
