use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::data::schema::{Field, MarketSchema};

/// One calendar day of raw data for one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub yes_price: f64,
    pub no_price: f64,
    pub volume: f64,
}

/// Column-keyed raw table as handed over by a data source.
///
/// Dates stay in their source text form until the enrichment pipeline
/// normalizes them. Numeric cells are `None` where the source had no value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketFrame {
    dates: Option<Vec<String>>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl MarketFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dates<I, S>(dates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dates: Some(dates.into_iter().map(Into::into).collect()),
            columns: BTreeMap::new(),
        }
    }

    pub fn with_column(mut self, key: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        self.insert_column(key, values);
        self
    }

    /// Shorthand for a column without missing cells.
    pub fn with_values(self, key: impl Into<String>, values: &[f64]) -> Self {
        self.with_column(key, values.iter().copied().map(Some).collect())
    }

    pub fn insert_column(&mut self, key: impl Into<String>, values: Vec<Option<f64>>) {
        self.columns.insert(key.into(), values);
    }

    pub fn from_observations(schema: &MarketSchema, observations: &[Observation]) -> Self {
        if observations.is_empty() {
            return Self::new();
        }

        let dates = observations.iter().map(|o| o.date.format("%Y-%m-%d").to_string());
        let column = |f: fn(&Observation) -> f64| -> Vec<Option<f64>> {
            observations.iter().map(|o| Some(f(o))).collect()
        };

        Self::with_dates(dates)
            .with_column(schema.key(Field::YesPrice), column(|o| o.yes_price))
            .with_column(schema.key(Field::NoPrice), column(|o| o.no_price))
            .with_column(schema.key(Field::Volume), column(|o| o.volume))
    }

    pub fn dates(&self) -> Option<&[String]> {
        self.dates.as_deref()
    }

    pub fn column(&self, key: &str) -> Option<&[Option<f64>]> {
        self.columns.get(key).map(Vec::as_slice)
    }

    /// Number of rows: the date column's length, or the longest numeric
    /// column when there is no date column.
    pub fn len(&self) -> usize {
        match &self.dates {
            Some(dates) => dates.len(),
            None => self.columns.values().map(Vec::len).max().unwrap_or(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyticsConfig;
    use crate::data::types::MarketId;

    #[test]
    fn test_from_observations_uses_schema_keys() {
        let id = MarketId::parse("market1").unwrap();
        let schema = MarketSchema::new(&id, &AnalyticsConfig::default());
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let frame = MarketFrame::from_observations(
            &schema,
            &[Observation { date, yes_price: 0.4, no_price: 0.6, volume: 120.0 }],
        );

        assert_eq!(frame.len(), 1);
        assert_eq!(frame.dates().unwrap(), &["2024-03-01".to_string()]);
        assert_eq!(frame.column("market1_yes_price").unwrap(), &[Some(0.4)]);
        assert_eq!(frame.column("market1_no_price").unwrap(), &[Some(0.6)]);
        assert_eq!(frame.column("market1_volume").unwrap(), &[Some(120.0)]);
    }

    #[test]
    fn test_empty_observations_give_empty_frame() {
        let id = MarketId::parse("market1").unwrap();
        let schema = MarketSchema::new(&id, &AnalyticsConfig::default());
        let frame = MarketFrame::from_observations(&schema, &[]);

        assert!(frame.is_empty());
        assert!(frame.dates().is_none());
        assert!(frame.column(schema.key(Field::YesPrice)).is_none());
    }

    #[test]
    fn test_len_without_dates() {
        let frame = MarketFrame::new()
            .with_values("a", &[1.0, 2.0])
            .with_values("b", &[1.0, 2.0, 3.0]);

        assert_eq!(frame.len(), 3);
        assert!(frame.column("a").is_some());
        assert!(frame.column("c").is_none());
    }
}
