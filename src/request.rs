use anyhow::{Context, Result};
use std::fmt::Write as _;
use tracing::{info, info_span, warn};

use crate::analytics::enrich;
use crate::config::Config;
use crate::data::schema::MarketSchema;
use crate::data::source::MarketDataSource;
use crate::data::types::MarketId;
use crate::monitoring::export::{dashboard_payload, write_json};
use crate::monitoring::logger::CsvLogger;
use crate::presentation::chart::{price_chart, volume_chart};
use crate::presentation::report::{details_panel, recent_insights};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// One user-initiated fetch: look up the market, pull its history, enrich
/// it and render the dashboard views.
///
/// Errors only come from the data source or from exports; the pipeline
/// itself always returns something renderable.
pub fn handle_request(
    source: &dyn MarketDataSource,
    config: &Config,
    raw_market_id: &str,
    days: usize,
    format: OutputFormat,
) -> Result<String> {
    let market_id = MarketId::parse(raw_market_id)?;
    let span = info_span!("request", market = %market_id, days);
    let _guard = span.enter();

    let details = source
        .market_details(&market_id)
        .with_context(|| format!("Failed to fetch details for {}", market_id))?;
    let frame = source
        .historical_prices(&market_id, days)
        .with_context(|| format!("Failed to fetch history for {}", market_id))?;

    let schema = MarketSchema::new(&market_id, &config.analytics);
    let series = enrich(&frame, &schema, &config.analytics);
    info!(
        "Enriched {} rows ({} high-volume days)",
        series.len(),
        series.high_volume_days()
    );

    #[cfg(feature = "metrics")]
    crate::monitoring::metrics::record_enrichment(&series);

    let charts = [
        price_chart(&series, &config.chart, &config.analytics),
        volume_chart(&series, &config.chart),
    ];
    let payload = dashboard_payload(&series, &charts)?;

    if config.monitoring.csv_export {
        let path = CsvLogger::new(&config.monitoring.csv_export_dir)?.log_series(&series)?;
        info!("CSV export written to {}", path.display());
    }
    if config.monitoring.json_export {
        let path = write_json(&config.monitoring.json_export_dir, &series, &payload)?;
        info!("JSON export written to {}", path.display());
    }

    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(&payload)?);
    }

    if let Some(reason) = series.missing_input() {
        warn!("No history to display for {}: {}", market_id, reason);
    }

    let mut out = String::new();
    writeln!(out, "{}", details_panel(&details))?;
    for chart in &charts {
        writeln!(out, "{}", chart.summary())?;
    }
    writeln!(
        out,
        "\nRecent Data Insights (Last {} Days - Mock)",
        config.report.recent_rows
    )?;
    write!(
        out,
        "{}",
        recent_insights(&series, &config.analytics, config.report.recent_rows)
    )?;

    Ok(out)
}
