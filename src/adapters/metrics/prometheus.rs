//! Prometheus Metrics Registry - Registry Observability
//!
//! Counts offer postings, settlements and failures, and tracks the
//! number of active offers. Rendered in the Prometheus text format on
//! demand (the console `metrics` command).

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Centralized Prometheus metrics for the offer registry.
///
/// All metrics follow the naming convention `otc_registry_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Offers posted, labelled `created` or `replaced`.
    pub offers_posted: IntCounterVec,
    /// Successful fulfilments.
    pub settlements: IntCounter,
    /// Failed registry calls by operation and error kind.
    pub failures: IntCounterVec,
    /// Offers currently active across all assets.
    pub active_offers: IntGauge,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let offers_posted = IntCounterVec::new(
            Opts::new("otc_registry_offers_posted_total", "Offers posted"),
            &["outcome"],
        )?;

        let settlements = IntCounter::new(
            "otc_registry_settlements_total",
            "Offers fulfilled",
        )?;

        let failures = IntCounterVec::new(
            Opts::new(
                "otc_registry_failures_total",
                "Failed registry calls",
            ),
            &["operation", "kind"],
        )?;

        let active_offers = IntGauge::new(
            "otc_registry_active_offers",
            "Active offers across all assets",
        )?;

        registry.register(Box::new(offers_posted.clone()))?;
        registry.register(Box::new(settlements.clone()))?;
        registry.register(Box::new(failures.clone()))?;
        registry.register(Box::new(active_offers.clone()))?;

        Ok(Self {
            registry,
            offers_posted,
            settlements,
            failures,
            active_offers,
        })
    }

    pub fn record_failure(&self, operation: &str, kind: &str) {
        self.failures.with_label_values(&[operation, kind]).inc();
    }

    pub fn set_active_offers(&self, count: usize) {
        self.active_offers
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Render every metric in the Prometheus text exposition format.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
