use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analytics::EnrichedSeries;
use crate::presentation::chart::ChartSpec;

/// Bundle handed to an external renderer: the enriched columns plus the
/// chart descriptions built from them.
pub fn dashboard_payload(series: &EnrichedSeries, charts: &[ChartSpec]) -> Result<Value> {
    let charts = charts
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to serialize charts")?;

    Ok(json!({
        "series": series.to_json(),
        "charts": charts,
    }))
}

/// Write `<dir>/<market_id>_dashboard.json`, replacing earlier output.
pub fn write_json(dir: impl AsRef<Path>, series: &EnrichedSeries, payload: &Value) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory: {}", dir.display()))?;

    let path = dir.join(format!("{}_dashboard.json", series.market_id()));
    let contents = serde_json::to_string_pretty(payload)?;
    fs::write(&path, contents)
        .with_context(|| format!("Failed to write JSON export: {}", path.display()))?;

    Ok(path)
}
