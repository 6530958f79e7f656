use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

use crate::analytics::EnrichedSeries;

pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

static ENRICHMENTS: Lazy<IntCounter> = Lazy::new(|| {
    register(IntCounter::new("insight_enrichments_total", "Enrichment requests served"))
});

static EMPTY_RESULTS: Lazy<IntCounter> = Lazy::new(|| {
    register(IntCounter::new(
        "insight_empty_results_total",
        "Enrichment requests that produced no rows",
    ))
});

static HIGH_VOLUME_DAYS: Lazy<IntCounter> = Lazy::new(|| {
    register(IntCounter::new(
        "insight_high_volume_days_total",
        "Days flagged as high volume",
    ))
});

fn register(counter: prometheus::Result<IntCounter>) -> IntCounter {
    let counter = counter.expect("metric definition is valid");
    if let Err(e) = REGISTRY.register(Box::new(counter.clone())) {
        tracing::warn!("Failed to register metric: {}", e);
    }
    counter
}

pub fn record_enrichment(series: &EnrichedSeries) {
    ENRICHMENTS.inc();
    if series.is_empty() {
        EMPTY_RESULTS.inc();
    }
    HIGH_VOLUME_DAYS.inc_by(series.high_volume_days() as u64);
}

/// Prometheus text exposition of every registered metric.
pub fn render() -> String {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}
