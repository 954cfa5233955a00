use axum::{
    extract::{ConnectInfo, State},
    http::{Method, StatusCode},
    middleware::{from_fn_with_state, Next},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod bookings;
pub mod error;
pub mod internal;
pub mod metrics;
pub mod middleware;
pub mod state;

pub use state::{AppState, AuthConfig};

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let authenticated = Router::new()
        .merge(bookings::routes())
        .merge(admin::routes())
        .route_layer(from_fn_with_state(state.clone(), middleware::require_caller));

    let internal = internal::routes()
        .route_layer(from_fn_with_state(state.clone(), middleware::require_internal_token));

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .merge(authenticated)
        .merge(internal)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn metrics_handler(State(state): State<AppState>) -> Result<String, error::AppError> {
    state.metrics
        .export()
        .map_err(|e| error::AppError::InternalServerError(format!("Metrics encoding failed: {}", e)))
}

async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: axum::extract::Request,
    next: Next,
) -> Result<impl IntoResponse, impl IntoResponse> {
    let (Some(redis), Some(ConnectInfo(addr))) = (
        state.redis.as_ref(),
        req.extensions().get::<ConnectInfo<SocketAddr>>().cloned(),
    ) else {
        return Ok(next.run(req).await);
    };

    let key = format!("ratelimit:{}", addr.ip());

    match redis.check_rate_limit(&key, state.rate_limit_per_minute, 60).await {
        Ok(true) => Ok(next.run(req).await),
        Ok(false) => Err((StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded")),
        Err(e) => {
            // Fail open
            tracing::warn!("Rate limiter unavailable: {}", e);
            Ok(next.run(req).await)
        }
    }
}
