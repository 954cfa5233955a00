use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Active,
    Cancelled,
    Completed,
}

/// What the event service reports about an event at the moment of the call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSnapshot {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub venue: String,
    pub time: String,
    pub price: f64,
    pub status: EventStatus,
    pub available_seats: i32,
    pub capacity: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Event not found: {0}")]
    NotFound(String),

    /// The ledger refused the delta, e.g. it would leave `availableSeats` outside `[0, capacity]`.
    #[error("Seat adjustment rejected ({status}): {message}")]
    Rejected {
        status: u16,
        message: String,
    },

    #[error("Seat ledger unavailable: {0}")]
    Unavailable(String),
}

/// The event service's seat ledger. The only authority on seat counts: a
/// successful `adjust_seats` is the single point where capacity is enforced.
#[async_trait]
pub trait SeatLedger: Send + Sync {
    async fn fetch_event(&self, event_id: &str) -> Result<EventSnapshot, LedgerError>;

    /// Apply a signed delta (negative consumes, positive returns) and return the
    /// new `availableSeats`.
    async fn adjust_seats(&self, event_id: &str, delta: i32) -> Result<i32, LedgerError>;
}
