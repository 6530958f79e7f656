use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

use crate::analytics::EnrichedSeries;

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Install the global `tracing` subscriber. Filter comes from `RUST_LOG`,
/// defaulting to `info`. Later calls are no-ops.
pub fn init_logger(service_name: &'static str) {
    LOGGER_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_line_number(true)
            .init();

        tracing::info!(service = service_name, "logger initialized");
    });
}

/// Writes one enriched series per file, one row per day.
pub struct CsvLogger {
    dir: PathBuf,
}

impl CsvLogger {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create export directory: {}", dir.display()))?;

        Ok(Self { dir })
    }

    pub fn path_for(&self, series: &EnrichedSeries) -> PathBuf {
        self.dir.join(format!("{}_enriched.csv", series.market_id()))
    }

    /// Write `series` to `<dir>/<market_id>_enriched.csv`, replacing any
    /// previous export for that market. Undefined values are blank cells.
    pub fn log_series(&self, series: &EnrichedSeries) -> Result<PathBuf> {
        let path = self.path_for(series);
        let file = File::create(&path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
        let mut out = BufWriter::new(file);

        writeln!(out, "{}", series.schema().outbound_columns().join(","))?;

        for row in series.rows() {
            let date = row.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
            writeln!(
                out,
                "{},{},{},{},{},{},{},{},{}",
                date,
                cell(row.yes_price),
                cell(row.no_price),
                cell(row.volume),
                cell(row.short_ma),
                cell(row.long_ma),
                cell(row.pct_change),
                cell(row.volatility),
                row.high_volume_day
            )?;
        }

        out.flush()?;
        tracing::debug!("Exported {} rows to {}", series.len(), path.display());
        Ok(path)
    }
}

fn cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.6}", v),
        None => String::new(),
    }
}
