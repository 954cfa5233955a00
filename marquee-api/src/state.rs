use std::sync::Arc;
use marquee_booking::BookingManager;
use marquee_store::RedisClient;

use crate::metrics::BookingMetrics;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub internal_token: String,
}

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<BookingManager>,
    /// Rate limiting is skipped when no Redis is configured.
    pub redis: Option<Arc<RedisClient>>,
    pub auth: AuthConfig,
    pub rate_limit_per_minute: i64,
    pub metrics: Arc<BookingMetrics>,
}
