use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub chart: ChartConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_markets")]
    pub default_markets: Vec<String>,
    #[serde(default = "default_history_days")]
    pub history_days: usize,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            default_markets: default_markets(),
            history_days: default_history_days(),
        }
    }
}

/// Windows and thresholds used by the enrichment pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_short_ma")]
    pub short_ma_window: usize,
    #[serde(default = "default_long_ma")]
    pub long_ma_window: usize,
    #[serde(default = "default_pct_periods")]
    pub pct_change_periods: usize,
    #[serde(default = "default_volatility_window")]
    pub volatility_window: usize,
    #[serde(default = "default_high_volume_quantile")]
    pub high_volume_quantile: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            short_ma_window: default_short_ma(),
            long_ma_window: default_long_ma(),
            pct_change_periods: default_pct_periods(),
            volatility_window: default_volatility_window(),
            high_volume_quantile: default_high_volume_quantile(),
        }
    }
}

impl AnalyticsConfig {
    pub fn validate(&self) -> Result<()> {
        let windows = [
            ("short_ma_window", self.short_ma_window),
            ("long_ma_window", self.long_ma_window),
            ("pct_change_periods", self.pct_change_periods),
            ("volatility_window", self.volatility_window),
        ];
        for (name, value) in windows {
            if value == 0 {
                bail!("analytics.{} must be at least 1", name);
            }
        }

        if !(0.0..=1.0).contains(&self.high_volume_quantile) {
            bail!(
                "analytics.high_volume_quantile must be within [0, 1], got {}",
                self.high_volume_quantile
            );
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_recent_rows")]
    pub recent_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            recent_rows: default_recent_rows(),
        }
    }
}

/// Shared chart template. Built once at startup and handed to every chart
/// builder by reference.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_title_font_size")]
    pub title_font_size: u32,
    #[serde(default = "default_font_color")]
    pub font_color: String,
    #[serde(default = "default_grid_color")]
    pub grid_color: String,
    #[serde(default = "default_margins")]
    pub margins: [u32; 4],
    #[serde(default = "default_yes_color")]
    pub yes_price_color: String,
    #[serde(default = "default_no_color")]
    pub no_price_color: String,
    #[serde(default = "default_short_ma_color")]
    pub short_ma_color: String,
    #[serde(default = "default_long_ma_color")]
    pub long_ma_color: String,
    #[serde(default = "default_volume_color")]
    pub volume_color: String,
    #[serde(default = "default_high_volume_color")]
    pub high_volume_color: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            title_font_size: default_title_font_size(),
            font_color: default_font_color(),
            grid_color: default_grid_color(),
            margins: default_margins(),
            yes_price_color: default_yes_color(),
            no_price_color: default_no_color(),
            short_ma_color: default_short_ma_color(),
            long_ma_color: default_long_ma_color(),
            volume_color: default_volume_color(),
            high_volume_color: default_high_volume_color(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub csv_export: bool,
    #[serde(default = "default_csv_dir")]
    pub csv_export_dir: String,
    #[serde(default)]
    pub json_export: bool,
    #[serde(default = "default_json_dir")]
    pub json_export_dir: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            csv_export: false,
            csv_export_dir: default_csv_dir(),
            json_export: false,
            json_export_dir: default_json_dir(),
        }
    }
}

fn default_markets() -> Vec<String> {
    ["market1", "market2", "market3"].iter().map(|m| m.to_string()).collect()
}
fn default_history_days() -> usize { 180 }
fn default_short_ma() -> usize { 7 }
fn default_long_ma() -> usize { 30 }
fn default_pct_periods() -> usize { 1 }
fn default_volatility_window() -> usize { 14 }
fn default_high_volume_quantile() -> f64 { 0.80 }
fn default_recent_rows() -> usize { 7 }
fn default_title_font_size() -> u32 { 16 }
fn default_font_color() -> String { "white".to_string() }
fn default_grid_color() -> String { "rgba(107, 114, 128, 0.3)".to_string() }
fn default_margins() -> [u32; 4] { [50, 20, 60, 40] }
fn default_yes_color() -> String { "#a855f7".to_string() }
fn default_no_color() -> String { "#f87171".to_string() }
fn default_short_ma_color() -> String { "#facc15".to_string() }
fn default_long_ma_color() -> String { "#34d399".to_string() }
fn default_volume_color() -> String { "#60a5fa".to_string() }
fn default_high_volume_color() -> String { "#f87171".to_string() }
fn default_csv_dir() -> String { "exports".to_string() }
fn default_json_dir() -> String { "exports".to_string() }

#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub config_path: String,
    pub mock_seed: Option<u64>,
    pub history_days: Option<usize>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {}", path))
    }

    /// Load the file when it exists, fall back to built-in defaults otherwise.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            tracing::warn!("Config file {} not found, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.analytics.validate()?;
        Ok(config)
    }
}

impl EnvConfig {
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let mock_seed = match std::env::var("INSIGHT_MOCK_SEED") {
            Ok(raw) => Some(
                raw.parse::<u64>()
                    .with_context(|| format!("INSIGHT_MOCK_SEED is not a u64: {}", raw))?,
            ),
            Err(_) => None,
        };

        let history_days = match std::env::var("INSIGHT_HISTORY_DAYS") {
            Ok(raw) => Some(
                raw.parse::<usize>()
                    .with_context(|| format!("INSIGHT_HISTORY_DAYS is not a count: {}", raw))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            config_path: std::env::var("INSIGHT_CONFIG_PATH")
                .unwrap_or_else(|_| "config.toml".to_string()),
            mock_seed,
            history_days,
        })
    }
}
