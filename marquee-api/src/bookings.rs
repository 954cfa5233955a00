use axum::{
    extract::{Extension, Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use marquee_booking::{BookingOutcome, CreateBooking};
use marquee_core::booking::{Booking, BookingStatus};
use marquee_core::identity::Caller;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

impl StatusQuery {
    pub fn parse(&self) -> Result<Option<BookingStatus>, AppError> {
        self.status
            .as_deref()
            .map(|s| s.parse::<BookingStatus>())
            .transpose()
            .map_err(|e| AppError::ValidationError(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedResponse {
    pub message: &'static str,
    pub booking: Booking,
}

/// Waitlisted bookings carry no payment yet, so only the queue position
/// details are returned.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntry {
    pub id: Uuid,
    pub booking_reference: String,
    pub booking_status: BookingStatus,
    pub event_id: String,
    pub event_title: String,
    pub event_date: DateTime<Utc>,
    pub event_venue: String,
    pub event_time: String,
    pub number_of_tickets: i32,
}

impl From<Booking> for WaitlistEntry {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            booking_reference: b.booking_reference,
            booking_status: b.booking_status,
            event_id: b.event_id,
            event_title: b.event_title,
            event_date: b.event_date,
            event_venue: b.event_venue,
            event_time: b.event_time,
            number_of_tickets: b.number_of_tickets,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistedResponse {
    pub message: &'static str,
    pub booking: WaitlistEntry,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBookingResponse {
    pub message: &'static str,
    pub booking: Booking,
    pub refund_amount: f64,
    pub seats_available: Option<i32>,
    pub promoted_bookings: Vec<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking).get(list_my_bookings))
        .route("/v1/bookings/{id}", get(get_booking))
        .route("/v1/bookings/reference/{reference}", get(get_booking_by_reference))
        .route("/v1/bookings/{id}/cancel", post(cancel_booking))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/bookings
async fn create_booking(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<CreateBooking>,
) -> Result<Response, AppError> {
    let outcome = state.bookings.create_booking(&caller, req).await.inspect_err(|e| {
        state.metrics.record_rejected(e);
    })?;

    let response = match outcome {
        BookingOutcome::Confirmed(booking) => {
            state.metrics.record_created("confirmed");
            (StatusCode::CREATED, Json(ConfirmedResponse { message: "Booking confirmed", booking })).into_response()
        }
        BookingOutcome::Waitlisted(booking) => {
            state.metrics.record_created("waitlisted");
            let booking = WaitlistEntry::from(booking);
            (StatusCode::ACCEPTED, Json(WaitlistedResponse { message: "Added to waitlist", booking })).into_response()
        }
    };

    Ok(response)
}

/// GET /v1/bookings
async fn list_my_bookings(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = state.bookings.list_my_bookings(&caller, query.parse()?).await?;
    Ok(Json(bookings))
}

/// GET /v1/bookings/{id}
async fn get_booking(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.bookings.get_booking(&caller, id).await?))
}

/// GET /v1/bookings/reference/{reference}
async fn get_booking_by_reference(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(reference): Path<String>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.bookings.get_booking_by_reference(&caller, &reference).await?))
}

/// POST /v1/bookings/{id}/cancel
async fn cancel_booking(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<CancelBookingResponse>, AppError> {
    let cancellation = state.bookings.cancel_booking(&caller, id).await?;

    let promoted_bookings: Vec<String> = cancellation
        .promotion
        .iter()
        .flat_map(|report| report.promoted.iter().map(|b| b.booking_reference.clone()))
        .collect();
    state.metrics.record_cancelled(promoted_bookings.len());

    Ok(Json(CancelBookingResponse {
        message: "Booking cancelled",
        booking: cancellation.booking,
        refund_amount: cancellation.refund_amount,
        seats_available: cancellation.seats_available,
        promoted_bookings,
    }))
}
