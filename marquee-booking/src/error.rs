use marquee_core::booking::InvalidTransition;
use marquee_core::ledger::LedgerError;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not enough seats: requested {requested}, available {available}")]
    InsufficientSeats {
        available: i32,
        requested: i32,
    },

    #[error("Booking {0} is already cancelled")]
    AlreadyCancelled(String),

    #[error("Event for booking {0} has already taken place")]
    EventAlreadyPassed(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Payment was declined; the booking was kept as pending and may be resubmitted.
    #[error("Payment failed for booking {reference}")]
    PaymentFailed {
        reference: String,
    },

    /// Payment went through but the ledger did not accept the seat delta. The
    /// booking is left unconfirmed with its payment reversed.
    #[error("Payment succeeded but inventory update failed for booking {reference}: {source}")]
    InventoryUpdateFailed {
        reference: String,
        #[source]
        source: LedgerError,
    },

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("Record store error: {0}")]
    Repository(String),
}

impl From<Box<dyn std::error::Error + Send + Sync>> for BookingError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        BookingError::Repository(err.to_string())
    }
}
