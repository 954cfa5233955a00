//! Maintenance calls made by the event service when an event is deleted or
//! edited.

use axum::{
    extract::{Json, Path, State},
    routing::{post, put},
    Router,
};
use serde::Serialize;
use marquee_core::booking::EventFields;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AffectedResponse {
    pub affected: u64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/internal/events/{event_id}/cancel-bookings", post(cancel_event_bookings))
        .route("/internal/events/{event_id}/booking-snapshot", put(sync_booking_snapshot))
}

/// POST /internal/events/{event_id}/cancel-bookings
async fn cancel_event_bookings(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<AffectedResponse>, AppError> {
    let affected = state.bookings.cancel_all_for_event(&event_id).await?;
    Ok(Json(AffectedResponse { affected }))
}

/// PUT /internal/events/{event_id}/booking-snapshot
async fn sync_booking_snapshot(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Json(fields): Json<EventFields>,
) -> Result<Json<AffectedResponse>, AppError> {
    let affected = state.bookings.sync_event_fields(&event_id, &fields).await?;
    Ok(Json(AffectedResponse { affected }))
}
