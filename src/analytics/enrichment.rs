use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, instrument, warn};

use crate::analytics::indicators::{
    distinct_count, moving_average, pct_change, quantile_linear, volatility,
};
use crate::config::AnalyticsConfig;
use crate::data::frame::MarketFrame;
use crate::data::schema::{Field, MarketSchema, DATE_COLUMN, HIGH_VOLUME_COLUMN};
use crate::data::types::MarketId;

/// One day of an enriched series. `None` marks a value that could not be
/// computed (or was absent in the source).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRow {
    pub date: Option<NaiveDate>,
    pub yes_price: Option<f64>,
    pub no_price: Option<f64>,
    pub volume: Option<f64>,
    pub short_ma: Option<f64>,
    pub long_ma: Option<f64>,
    pub pct_change: Option<f64>,
    pub volatility: Option<f64>,
    pub high_volume_day: bool,
}

/// Why enrichment produced no rows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MissingInput {
    #[error("series is empty")]
    EmptySeries,

    #[error("column '{0}' not found")]
    MissingColumn(String),

    #[error("column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
}

/// Cell of a single outbound column.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Date(Option<NaiveDate>),
    Number(Option<f64>),
    Flag(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedSeries {
    schema: MarketSchema,
    rows: Vec<EnrichedRow>,
    missing: Option<MissingInput>,
}

impl EnrichedSeries {
    fn missing(schema: &MarketSchema, reason: MissingInput) -> Self {
        warn!("Skipping enrichment for {}: {}", schema.market_id(), reason);
        Self {
            schema: schema.clone(),
            rows: Vec::new(),
            missing: Some(reason),
        }
    }

    pub fn market_id(&self) -> &MarketId {
        self.schema.market_id()
    }

    pub fn schema(&self) -> &MarketSchema {
        &self.schema
    }

    pub fn rows(&self) -> &[EnrichedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Reason the result is empty, if the input could not be processed.
    pub fn missing_input(&self) -> Option<&MissingInput> {
        self.missing.as_ref()
    }

    pub fn latest(&self) -> Option<&EnrichedRow> {
        self.rows.last()
    }

    /// Last `n` rows in date order.
    pub fn tail(&self, n: usize) -> &[EnrichedRow] {
        &self.rows[self.rows.len().saturating_sub(n)..]
    }

    pub fn high_volume_days(&self) -> usize {
        self.rows.iter().filter(|r| r.high_volume_day).count()
    }

    /// Column lookup by outbound name, e.g. `market1_yes_price_7d_ma`.
    pub fn column(&self, key: &str) -> Option<Vec<Cell>> {
        if key == DATE_COLUMN {
            return Some(self.rows.iter().map(|r| Cell::Date(r.date)).collect());
        }
        if key == HIGH_VOLUME_COLUMN {
            return Some(self.rows.iter().map(|r| Cell::Flag(r.high_volume_day)).collect());
        }

        let fields = [
            Field::YesPrice,
            Field::NoPrice,
            Field::Volume,
            Field::ShortMa,
            Field::LongMa,
            Field::PctChange,
            Field::Volatility,
        ];
        let field = fields.into_iter().find(|f| self.schema.key(*f) == key)?;

        Some(
            self.rows
                .iter()
                .map(|r| Cell::Number(numeric_field(r, field)))
                .collect(),
        )
    }

    /// Column-keyed JSON for the presentation layer. Undefined values are
    /// `null`, dates are `YYYY-MM-DD`.
    pub fn to_json(&self) -> Value {
        let mut columns = Map::new();

        for key in self.schema.outbound_columns() {
            let values: Vec<Value> = self
                .column(key)
                .unwrap_or_default()
                .into_iter()
                .map(|cell| match cell {
                    Cell::Date(date) => json!(date.map(|d| d.format("%Y-%m-%d").to_string())),
                    Cell::Number(value) => json!(value),
                    Cell::Flag(flag) => json!(flag),
                })
                .collect();
            columns.insert(key.to_string(), Value::Array(values));
        }

        json!({
            "market_id": self.market_id().as_str(),
            "rows": self.len(),
            "missing_input": self.missing.as_ref().map(ToString::to_string),
            "columns": columns,
        })
    }
}

fn numeric_field(row: &EnrichedRow, field: Field) -> Option<f64> {
    match field {
        Field::YesPrice => row.yes_price,
        Field::NoPrice => row.no_price,
        Field::Volume => row.volume,
        Field::ShortMa => row.short_ma,
        Field::LongMa => row.long_ma,
        Field::PctChange => row.pct_change,
        Field::Volatility => row.volatility,
    }
}

/// Derive moving averages, percentage change, volatility and high-volume
/// flags for one market's raw history.
///
/// Never fails: unusable input yields an empty series carrying the reason,
/// and indicators lacking history are `None`.
#[instrument(skip_all, fields(market = %schema.market_id(), rows = frame.len()))]
pub fn enrich(
    frame: &MarketFrame,
    schema: &MarketSchema,
    analytics: &AnalyticsConfig,
) -> EnrichedSeries {
    if frame.is_empty() {
        return EnrichedSeries::missing(schema, MissingInput::EmptySeries);
    }

    let row_count = frame.len();
    let yes_key = schema.key(Field::YesPrice);
    let yes_column = match frame.column(yes_key) {
        None => {
            return EnrichedSeries::missing(schema, MissingInput::MissingColumn(yes_key.to_string()))
        }
        Some(column) if column.len() != row_count => {
            return EnrichedSeries::missing(
                schema,
                MissingInput::LengthMismatch {
                    column: yes_key.to_string(),
                    expected: row_count,
                    actual: column.len(),
                },
            )
        }
        Some(column) => column,
    };

    let order = normalized_order(frame);
    if order.is_empty() {
        return EnrichedSeries::missing(schema, MissingInput::EmptySeries);
    }

    let pick = |column: &[Option<f64>]| -> Vec<Option<f64>> {
        order.iter().map(|(index, _)| column[*index]).collect()
    };

    let yes = pick(yes_column);
    let no = optional_column(frame, schema.key(Field::NoPrice), row_count).map(pick);
    let volume = optional_column(frame, schema.key(Field::Volume), row_count).map(pick);

    let yes_values: Vec<f64> = yes.iter().map(|v| v.unwrap_or(f64::NAN)).collect();
    let short_ma = moving_average(&yes_values, analytics.short_ma_window);
    let long_ma = moving_average(&yes_values, analytics.long_ma_window);
    let pct = pct_change(&yes_values, analytics.pct_change_periods);
    let vol = volatility(&yes_values, analytics.volatility_window);
    let high_volume = high_volume_flags(
        volume.as_deref(),
        analytics.high_volume_quantile,
        order.len(),
    );

    let rows = order
        .iter()
        .enumerate()
        .map(|(i, (_, date))| EnrichedRow {
            date: *date,
            yes_price: yes[i],
            no_price: no.as_ref().and_then(|c| c[i]),
            volume: volume.as_ref().and_then(|c| c[i]),
            short_ma: short_ma[i],
            long_ma: long_ma[i],
            pct_change: pct[i],
            volatility: vol[i],
            high_volume_day: high_volume[i],
        })
        .collect();

    EnrichedSeries {
        schema: schema.clone(),
        rows,
        missing: None,
    }
}

/// Source row indices in ascending date order, paired with the parsed date.
/// Rows whose date cannot be parsed are dropped. Without a date column the
/// source order is kept.
fn normalized_order(frame: &MarketFrame) -> Vec<(usize, Option<NaiveDate>)> {
    let Some(raw_dates) = frame.dates() else {
        warn!("Column '{}' missing, keeping source order", DATE_COLUMN);
        return (0..frame.len()).map(|i| (i, None)).collect();
    };

    let mut order: Vec<(usize, Option<NaiveDate>)> = raw_dates
        .iter()
        .enumerate()
        .filter_map(|(i, raw)| match parse_date(raw) {
            Some(date) => Some((i, Some(date))),
            None => {
                warn!(row = i, value = %raw, "Dropping row with unparseable date");
                None
            }
        })
        .collect();

    // Stable: rows sharing a date keep their source order.
    order.sort_by_key(|(_, date)| *date);
    order
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
                .ok()
                .map(|dt| dt.date())
        })
}

fn optional_column<'a>(
    frame: &'a MarketFrame,
    key: &str,
    row_count: usize,
) -> Option<&'a [Option<f64>]> {
    let column = frame.column(key)?;
    if column.len() != row_count {
        warn!(
            "Column '{}' has {} rows, expected {}; ignoring it",
            key,
            column.len(),
            row_count
        );
        return None;
    }
    Some(column)
}

/// Flag days whose volume strictly exceeds the `quantile` of the whole
/// series. Missing cells count as zero volume. Absent or constant volume
/// flags nothing.
fn high_volume_flags(volume: Option<&[Option<f64>]>, quantile: f64, len: usize) -> Vec<bool> {
    let Some(volume) = volume else {
        return vec![false; len];
    };

    let filled: Vec<f64> = volume
        .iter()
        .map(|v| v.filter(|x| x.is_finite()).unwrap_or(0.0))
        .collect();

    if distinct_count(&filled) <= 1 {
        debug!("Volume has no variation, no high-volume days");
        return vec![false; len];
    }

    match quantile_linear(&filled, quantile) {
        Some(threshold) => {
            debug!(threshold, "High-volume threshold computed");
            filled.iter().map(|v| *v > threshold).collect()
        }
        None => vec![false; len],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(id: &str) -> MarketSchema {
        MarketSchema::new(&MarketId::parse(id).unwrap(), &AnalyticsConfig::default())
    }

    fn dates(n: usize) -> Vec<String> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| (start + chrono::Duration::days(i as i64)).format("%Y-%m-%d").to_string())
            .collect()
    }

    fn frame(id: &str, yes: &[f64], volume: Option<&[f64]>) -> MarketFrame {
        let mut frame = MarketFrame::with_dates(dates(yes.len()))
            .with_values(format!("{}_yes_price", id), yes)
            .with_values(
                format!("{}_no_price", id),
                &yes.iter().map(|y| 1.0 - y).collect::<Vec<_>>(),
            );
        if let Some(volume) = volume {
            frame = frame.with_values(format!("{}_volume", id), volume);
        }
        frame
    }

    #[test]
    fn test_empty_series_returns_empty_result() {
        let result = enrich(&MarketFrame::new(), &schema("market1"), &AnalyticsConfig::default());

        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
        assert_eq!(result.missing_input(), Some(&MissingInput::EmptySeries));
    }

    #[test]
    fn test_missing_price_column() {
        let input = MarketFrame::with_dates(dates(3)).with_values("market1_volume", &[1.0, 2.0, 3.0]);
        let result = enrich(&input, &schema("market1"), &AnalyticsConfig::default());

        assert!(result.is_empty());
        assert_eq!(
            result.missing_input(),
            Some(&MissingInput::MissingColumn("market1_yes_price".to_string()))
        );
    }

    #[test]
    fn test_price_column_length_mismatch() {
        let input = MarketFrame::with_dates(dates(3)).with_values("market1_yes_price", &[0.5, 0.6]);
        let result = enrich(&input, &schema("market1"), &AnalyticsConfig::default());

        assert!(result.is_empty());
        assert!(matches!(
            result.missing_input(),
            Some(MissingInput::LengthMismatch { expected: 3, actual: 2, .. })
        ));
    }

    #[test]
    fn test_degenerate_result_is_not_missing() {
        let result = enrich(
            &frame("market1", &[0.5], None),
            &schema("market1"),
            &AnalyticsConfig::default(),
        );

        assert_eq!(result.len(), 1);
        assert!(result.missing_input().is_none());
        let row = &result.rows()[0];
        assert_eq!(row.short_ma, Some(0.5));
        assert_eq!(row.pct_change, None);
        assert_eq!(row.volatility, None);
        assert!(!row.high_volume_day);
    }

    #[test]
    fn test_sorts_out_of_order_dates() {
        let input = MarketFrame::with_dates(["2024-01-03", "2024-01-01", "2024-01-02"])
            .with_values("m_yes_price", &[0.6, 0.5, 0.5]);
        let result = enrich(&input, &schema("m"), &AnalyticsConfig::default());

        let dates: Vec<_> = result.rows().iter().map(|r| r.date.unwrap().to_string()).collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);

        let yes: Vec<_> = result.rows().iter().map(|r| r.yes_price.unwrap()).collect();
        assert_eq!(yes, vec![0.5, 0.5, 0.6]);

        assert_eq!(result.rows()[0].pct_change, None);
        assert!((result.rows()[1].pct_change.unwrap()).abs() < 1e-9);
        assert!((result.rows()[2].pct_change.unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_mixed_date_formats_normalized() {
        let input = MarketFrame::with_dates([
            "2024-02-02T15:30:00Z",
            "2024-02-01 08:00:00",
            " 2024-02-03 ",
        ])
        .with_values("m_yes_price", &[0.2, 0.1, 0.3]);
        let result = enrich(&input, &schema("m"), &AnalyticsConfig::default());

        let dates: Vec<_> = result.rows().iter().map(|r| r.date.unwrap()).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 3).unwrap(),
            ]
        );
    }

    #[test]
    fn test_unparseable_dates_dropped() {
        let input = MarketFrame::with_dates(["2024-01-01", "yesterday", "2024-01-02"])
            .with_values("m_yes_price", &[0.5, 0.9, 0.6]);
        let result = enrich(&input, &schema("m"), &AnalyticsConfig::default());

        assert_eq!(result.len(), 2);
        let yes: Vec<_> = result.rows().iter().map(|r| r.yes_price.unwrap()).collect();
        assert_eq!(yes, vec![0.5, 0.6]);
    }

    #[test]
    fn test_all_dates_unparseable_is_empty() {
        let input = MarketFrame::with_dates(["soon", "later"]).with_values("m_yes_price", &[0.5, 0.6]);
        let result = enrich(&input, &schema("m"), &AnalyticsConfig::default());

        assert!(result.is_empty());
        assert_eq!(result.missing_input(), Some(&MissingInput::EmptySeries));
    }

    #[test]
    fn test_missing_date_column_keeps_order() {
        let input = MarketFrame::new().with_values("m_yes_price", &[0.4, 0.5]);
        let result = enrich(&input, &schema("m"), &AnalyticsConfig::default());

        assert_eq!(result.len(), 2);
        assert!(result.rows().iter().all(|r| r.date.is_none()));
        assert_eq!(result.rows()[1].yes_price, Some(0.5));
    }

    #[test]
    fn test_high_volume_flags_strictly_above_threshold() {
        let input = frame("m", &[0.5; 5], Some(&[10.0, 10.0, 10.0, 10.0, 100.0]));
        let result = enrich(&input, &schema("m"), &AnalyticsConfig::default());

        let flags: Vec<bool> = result.rows().iter().map(|r| r.high_volume_day).collect();
        assert_eq!(flags, vec![false, false, false, false, true]);
        assert_eq!(result.high_volume_days(), 1);
    }

    #[test]
    fn test_ties_at_threshold_not_flagged() {
        // Threshold of [1, 2, 3, 3, 3] at 0.8 is exactly 3.
        let input = frame("m", &[0.5; 5], Some(&[1.0, 2.0, 3.0, 3.0, 3.0]));
        let result = enrich(&input, &schema("m"), &AnalyticsConfig::default());

        assert_eq!(result.high_volume_days(), 0);
    }

    #[test]
    fn test_constant_or_absent_volume_flags_nothing() {
        let constant = frame("m", &[0.5, 0.6, 0.7], Some(&[500.0, 500.0, 500.0]));
        let absent = frame("m", &[0.5, 0.6, 0.7], None);

        for input in [constant, absent] {
            let result = enrich(&input, &schema("m"), &AnalyticsConfig::default());
            assert_eq!(result.len(), 3);
            assert_eq!(result.high_volume_days(), 0);
        }
    }

    #[test]
    fn test_missing_volume_cells_count_as_zero() {
        let input = MarketFrame::with_dates(dates(5))
            .with_values("m_yes_price", &[0.5; 5])
            .with_column("m_volume", vec![None, None, None, None, Some(50.0)]);
        let result = enrich(&input, &schema("m"), &AnalyticsConfig::default());

        let flags: Vec<bool> = result.rows().iter().map(|r| r.high_volume_day).collect();
        assert_eq!(flags, vec![false, false, false, false, true]);
        assert_eq!(result.rows()[0].volume, None);
    }

    #[test]
    fn test_short_history_volatility_undefined() {
        let yes: Vec<f64> = (0..10).map(|i| 0.3 + 0.02 * i as f64).collect();
        let result = enrich(&frame("m", &yes, None), &schema("m"), &AnalyticsConfig::default());

        assert_eq!(result.len(), 10);
        assert!(result.rows().iter().all(|r| r.volatility.is_none()));
        assert!(result.rows().iter().all(|r| r.long_ma.is_some()));
    }

    #[test]
    fn test_enrichment_is_repeatable() {
        let yes: Vec<f64> = (0..45).map(|i| 0.5 + 0.1 * ((i as f64) * 0.7).sin()).collect();
        let volume: Vec<f64> = (0..45).map(|i| 100.0 + ((i * 37) % 11) as f64 * 90.0).collect();
        let input = frame("market2", &yes, Some(&volume));
        let schema = schema("market2");

        let first = enrich(&input, &schema, &AnalyticsConfig::default());
        let second = enrich(&input, &schema, &AnalyticsConfig::default());

        assert_eq!(first, second);
        assert_eq!(first.to_json(), second.to_json());
        assert!(first.rows()[20].volatility.is_some());
    }

    #[test]
    fn test_column_access_by_outbound_name() {
        let input = frame("market1", &[0.5, 0.5, 0.6], Some(&[1.0, 2.0, 3.0]));
        let result = enrich(&input, &schema("market1"), &AnalyticsConfig::default());

        let pct = result.column("market1_yes_price_1d_pct_change").unwrap();
        assert_eq!(pct[0], Cell::Number(None));
        assert!(matches!(pct[2], Cell::Number(Some(v)) if (v - 20.0).abs() < 1e-9));

        let flags = result.column("high_volume_day").unwrap();
        assert_eq!(flags[2], Cell::Flag(true));

        assert!(result.column("market1_yes_price_7d_ma").is_some());
        assert!(result.column("market2_yes_price").is_none());
    }

    #[test]
    fn test_json_uses_null_for_undefined() {
        let input = frame("market1", &[0.5, 0.5, 0.6], None);
        let result = enrich(&input, &schema("market1"), &AnalyticsConfig::default());
        let json = result.to_json();

        let columns = &json["columns"];
        assert_eq!(columns["date"][0], "2024-01-01");
        assert!(columns["market1_yes_price_1d_pct_change"][0].is_null());
        assert!(columns["market1_yes_price_14d_volatility"][2].is_null());
        assert_eq!(columns["high_volume_day"][1], false);
        assert_eq!(json["rows"], 3);
        assert!(json["missing_input"].is_null());
    }

    #[test]
    fn test_tail_and_latest() {
        let input = frame("m", &[0.1, 0.2, 0.3, 0.4], None);
        let result = enrich(&input, &schema("m"), &AnalyticsConfig::default());

        assert_eq!(result.tail(2).len(), 2);
        assert_eq!(result.tail(10).len(), 4);
        assert_eq!(result.latest().unwrap().yes_price, Some(0.4));
    }
}
