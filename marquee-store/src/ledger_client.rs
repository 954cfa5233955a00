//! HTTP client for the event service's seat ledger.
//!
//! `GET {base}/events/{id}` returns the event snapshot, `PATCH {base}/events/{id}/seats`
//! with `{"seatsToBook": delta}` applies a signed seat delta and answers with
//! `{"availableSeats": n}`. The event service rejects any delta that would leave
//! the count outside `[0, capacity]` with a 4xx.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use marquee_core::ledger::{EventSnapshot, LedgerError, SeatLedger};

pub struct HttpSeatLedger {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeatAdjustment {
    seats_to_book: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeatAdjustmentResponse {
    available_seats: i32,
}

impl HttpSeatLedger {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn event_url(&self, event_id: &str) -> String {
        format!("{}/events/{}", self.base_url, event_id)
    }
}

fn transport_error(err: reqwest::Error) -> LedgerError {
    LedgerError::Unavailable(err.to_string())
}

async fn status_error(event_id: &str, response: reqwest::Response) -> LedgerError {
    let status = response.status();
    let message = response.text().await.unwrap_or_default();

    if status == StatusCode::NOT_FOUND {
        LedgerError::NotFound(event_id.to_string())
    } else if status.is_client_error() {
        LedgerError::Rejected {
            status: status.as_u16(),
            message,
        }
    } else {
        LedgerError::Unavailable(format!("HTTP {}: {}", status.as_u16(), message))
    }
}

#[async_trait]
impl SeatLedger for HttpSeatLedger {
    async fn fetch_event(&self, event_id: &str) -> Result<EventSnapshot, LedgerError> {
        let response = self.client
            .get(self.event_url(event_id))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(status_error(event_id, response).await);
        }

        response.json::<EventSnapshot>().await.map_err(|e| {
            warn!(event_id, "Malformed event snapshot: {}", e);
            LedgerError::Unavailable(e.to_string())
        })
    }

    async fn adjust_seats(&self, event_id: &str, delta: i32) -> Result<i32, LedgerError> {
        let response = self.client
            .patch(format!("{}/seats", self.event_url(event_id)))
            .json(&SeatAdjustment { seats_to_book: delta })
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(status_error(event_id, response).await);
        }

        let body = response
            .json::<SeatAdjustmentResponse>()
            .await
            .map_err(transport_error)?;

        debug!(event_id, delta, available = body.available_seats, "Seat delta applied");
        Ok(body.available_seats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjustment_body_shape() {
        let body = serde_json::to_value(SeatAdjustment { seats_to_book: -3 }).unwrap();
        assert_eq!(body, serde_json::json!({ "seatsToBook": -3 }));

        let parsed: SeatAdjustmentResponse = serde_json::from_str(r#"{"availableSeats": 7}"#).unwrap();
        assert_eq!(parsed.available_seats, 7);
    }

    #[test]
    fn test_base_url_is_normalised() {
        let ledger = HttpSeatLedger::new("http://events:5001/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(ledger.event_url("abc"), "http://events:5001/api/events/abc");
    }
}
