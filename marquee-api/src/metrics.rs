use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use marquee_booking::BookingError;

/// Booking counters, served as Prometheus text on `/metrics`.
pub struct BookingMetrics {
    registry: Registry,
    created: IntCounterVec,
    cancelled: IntCounter,
    promotions: IntCounter,
}

impl BookingMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let created = IntCounterVec::new(
            Opts::new("marquee_bookings_created_total", "Booking creation attempts by outcome"),
            &["outcome"],
        )?;
        let cancelled = IntCounter::new("marquee_bookings_cancelled_total", "Bookings cancelled by their owner or an admin")?;
        let promotions = IntCounter::new(
            "marquee_waitlist_promotions_total",
            "Waitlisted bookings promoted by cancellations made through the API (sweep promotions are only logged)",
        )?;

        registry.register(Box::new(created.clone()))?;
        registry.register(Box::new(cancelled.clone()))?;
        registry.register(Box::new(promotions.clone()))?;

        Ok(Self {
            registry,
            created,
            cancelled,
            promotions,
        })
    }

    pub fn record_created(&self, outcome: &str) {
        self.created.with_label_values(&[outcome]).inc();
    }

    pub fn record_rejected(&self, err: &BookingError) {
        let outcome = match err {
            BookingError::PaymentFailed { .. } => "payment_failed",
            BookingError::InventoryUpdateFailed { .. } => "inventory_failed",
            _ => "rejected",
        };
        self.record_created(outcome);
    }

    /// Counts a cancellation and the promotions its own pass made. Passes run
    /// by the reconciliation sweep never reach this registry.
    pub fn record_cancelled(&self, promoted: usize) {
        self.cancelled.inc();
        self.promotions.inc_by(promoted as u64);
    }

    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
