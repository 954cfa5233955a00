use axum::{
    extract::{Extension, Json, Path, Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;
use marquee_core::analytics::BookingAnalytics;
use marquee_core::booking::Booking;
use marquee_core::identity::Caller;

use crate::bookings::StatusQuery;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub event_id: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/events/{event_id}/bookings", get(list_event_bookings))
        .route("/v1/admin/analytics", get(analytics))
}

/// GET /v1/admin/events/{event_id}/bookings
async fn list_event_bookings(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(event_id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = state.bookings
        .list_event_bookings(&caller, &event_id, query.parse()?)
        .await?;
    Ok(Json(bookings))
}

/// GET /v1/admin/analytics
async fn analytics(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<BookingAnalytics>, AppError> {
    let summary = state.bookings
        .analytics(&caller, query.event_id.as_deref())
        .await?;
    Ok(Json(summary))
}
