use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use marquee_api::{app, metrics::BookingMetrics, AppState, AuthConfig};
use marquee_booking::{BookingManager, ReconciliationSweep, SimulatedPaymentGateway};
use marquee_core::ledger::SeatLedger;
use marquee_core::notify::Notifier;
use marquee_core::repository::BookingRepository;
use marquee_store::app_config::Config;
use marquee_store::{
    DbClient, EmailNotifier, EventProducer, FanoutNotifier, HttpSeatLedger, KafkaNotifier, LogNotifier,
    PgBookingRepository, RedisClient,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marquee_api=debug,marquee_booking=debug,marquee_store=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting Marquee booking service on port {}", config.server.port);

    // Booking records
    let db = DbClient::new(&config.database.url, config.database.max_connections).await?;
    db.migrate().await?;
    let repo: Arc<dyn BookingRepository> = Arc::new(PgBookingRepository::new(db.pool.clone()));

    // Event service seat ledger
    let ledger: Arc<dyn SeatLedger> = Arc::new(HttpSeatLedger::new(
        &config.ledger.base_url,
        Duration::from_millis(config.ledger.timeout_ms),
    )?);

    // Redis is optional; the rate limiter fails open without it
    let redis = match &config.redis {
        Some(redis_config) => match RedisClient::new(&redis_config.url).await {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::warn!("Redis unavailable, rate limiting disabled: {}", e);
                None
            }
        },
        None => None,
    };

    let mut sinks: Vec<Arc<dyn Notifier>> = vec![Arc::new(LogNotifier)];
    if let Some(kafka) = &config.kafka {
        let producer = EventProducer::new(&kafka.brokers)?;
        sinks.push(Arc::new(KafkaNotifier::new(producer, kafka.topic.clone())));
    }
    if let Some(smtp) = &config.smtp {
        sinks.push(Arc::new(EmailNotifier::new(smtp)?));
    }
    let notifier = Arc::new(FanoutNotifier::new(sinks));

    let payments = Arc::new(SimulatedPaymentGateway::new(config.booking.payment_success_rate));
    let manager = Arc::new(BookingManager::new(repo.clone(), ledger.clone(), payments, notifier));

    let sweep = ReconciliationSweep::new(repo, ledger, manager.promoter().clone());
    tokio::spawn(sweep.run(Duration::from_secs(config.booking.reconciliation_interval_seconds)));

    let app_state = AppState {
        bookings: manager,
        redis,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            internal_token: config.auth.internal_token.clone(),
        },
        rate_limit_per_minute: config.booking.rate_limit_per_minute,
        metrics: Arc::new(BookingMetrics::new()?),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    ).await?;

    Ok(())
}
