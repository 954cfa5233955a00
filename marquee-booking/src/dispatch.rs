use std::sync::Arc;
use tracing::warn;
use marquee_core::booking::Booking;
use marquee_core::notify::{BookingNotification, Notifier};
use marquee_shared::models::events::BookingEventKind;

/// Hands notifications to a spawned task so a slow or failing sink never
/// delays or undoes a booking transition.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub fn dispatch(&self, kind: BookingEventKind, booking: &Booking) {
        let notifier = self.notifier.clone();
        let notification = BookingNotification::new(kind, booking);

        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&notification).await {
                warn!(
                    booking_reference = %notification.booking.booking_reference,
                    kind = kind.as_str(),
                    "Notification not delivered: {}", e
                );
            }
        });
    }
}
