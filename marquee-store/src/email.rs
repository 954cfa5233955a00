//! Booking emails over SMTP.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use marquee_core::notify::{BookingNotification, Notifier, NotifyError};

use crate::app_config::SmtpConfig;

pub struct EmailNotifier {
    from_address: String,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, lettre::transport::smtp::Error> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port);

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            from_address: config.from_address.clone(),
            mailer: builder.build(),
        })
    }

    fn build_message(&self, to: &str, notification: &BookingNotification) -> Result<Message, NotifyError> {
        let from = self.from_address
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Delivery(e.to_string()))?;
        let to = to
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Delivery(e.to_string()))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(notification.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body())
            .map_err(|e| NotifyError::Delivery(e.to_string()))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, notification: &BookingNotification) -> Result<(), NotifyError> {
        let booking = &notification.booking;
        let to = booking
            .user_email
            .as_ref()
            .ok_or_else(|| NotifyError::NoRecipient(booking.booking_reference.clone()))?;

        let message = self.build_message(to.expose(), notification)?;
        self.mailer
            .send(message)
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        tracing::info!(to = %to.hint(), booking_reference = %booking.booking_reference, "Booking email sent");
        Ok(())
    }
}
