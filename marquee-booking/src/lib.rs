pub mod error;
pub mod payment;
pub mod dispatch;
pub mod waitlist;
pub mod manager;
pub mod reconciliation;

pub use error::BookingError;
pub use payment::SimulatedPaymentGateway;
pub use dispatch::NotificationDispatcher;
pub use waitlist::{PassOutcome, PromotionReport, WaitlistPromoter};
pub use manager::{BookingManager, BookingOutcome, Cancellation, CreateBooking};
pub use reconciliation::{ReconciliationSweep, SweepReport};

#[cfg(test)]
pub(crate) mod testing;
