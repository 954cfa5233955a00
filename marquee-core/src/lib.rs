pub mod booking;
pub mod reference;
pub mod ledger;
pub mod repository;
pub mod identity;
pub mod payment;
pub mod notify;
pub mod analytics;

pub use booking::{Booking, BookingStatus, EventFields, PaymentStatus, SeatRestoration};
pub use identity::{Caller, Role};
pub use ledger::{EventSnapshot, EventStatus, LedgerError, SeatLedger};
pub use repository::{BookingFilter, BookingRepository, RepoResult};
