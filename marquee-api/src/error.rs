use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use marquee_booking::BookingError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    ValidationError(String),
    Booking(BookingError),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut context = Map::new();

        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Booking(err) => match err {
                BookingError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                BookingError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
                BookingError::InsufficientSeats { available, requested } => {
                    context.insert("availableSeats".to_string(), json!(available));
                    context.insert("requested".to_string(), json!(requested));
                    (StatusCode::CONFLICT, err.to_string())
                }
                BookingError::AlreadyCancelled(_)
                | BookingError::EventAlreadyPassed(_)
                | BookingError::InvalidTransition(_) => {
                    (StatusCode::CONFLICT, err.to_string())
                }
                BookingError::Forbidden(_) => (StatusCode::FORBIDDEN, err.to_string()),
                BookingError::PaymentFailed { ref reference } => {
                    context.insert("bookingReference".to_string(), json!(reference));
                    (StatusCode::PAYMENT_REQUIRED, err.to_string())
                }
                BookingError::InventoryUpdateFailed { ref reference, ref source } => {
                    tracing::error!(booking_reference = %reference, "Inventory update failed: {}", source);
                    context.insert("bookingReference".to_string(), json!(reference));
                    (StatusCode::BAD_GATEWAY, "payment succeeded but inventory update failed".to_string())
                }
                BookingError::Repository(msg) => {
                    tracing::error!("Internal Server Error: {}", msg);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
                }
            },
        };

        context.insert("error".to_string(), Value::String(error_message));

        (status, Json(Value::Object(context))).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError::Booking(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use marquee_core::ledger::LedgerError;

    async fn render(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_conflict_carries_availability() {
        let (status, body) = render(BookingError::InsufficientSeats { available: 2, requested: 5 }.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["availableSeats"], 2);
        assert_eq!(body["requested"], 5);
    }

    #[tokio::test]
    async fn test_inventory_failure_is_distinct_from_validation() {
        let err = BookingError::InventoryUpdateFailed {
            reference: "BK1".to_string(),
            source: LedgerError::Unavailable("timeout".to_string()),
        };
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["bookingReference"], "BK1");
        assert_eq!(body["error"], "payment succeeded but inventory update failed");
    }

    #[tokio::test]
    async fn test_store_errors_are_opaque() {
        let (status, body) = render(BookingError::Repository("connection reset".to_string()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal Server Error");
    }
}
