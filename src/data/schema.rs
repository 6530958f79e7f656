use crate::config::AnalyticsConfig;
use crate::data::types::MarketId;
use serde::Serialize;

pub const DATE_COLUMN: &str = "date";
pub const HIGH_VOLUME_COLUMN: &str = "high_volume_day";

/// Logical fields of a market table, independent of the market they belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    YesPrice,
    NoPrice,
    Volume,
    ShortMa,
    LongMa,
    PctChange,
    Volatility,
}

/// Concrete column keys for one market.
///
/// Raw columns are `<id>_yes_price`, `<id>_no_price` and `<id>_volume`.
/// Derived columns hang off the yes price key and carry their window, e.g.
/// `<id>_yes_price_7d_ma` or `<id>_yes_price_14d_volatility`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketSchema {
    market_id: MarketId,
    yes_price: String,
    no_price: String,
    volume: String,
    short_ma: String,
    long_ma: String,
    pct_change: String,
    volatility: String,
}

impl MarketSchema {
    pub fn new(market_id: &MarketId, analytics: &AnalyticsConfig) -> Self {
        let yes_price = format!("{}_yes_price", market_id);

        Self {
            market_id: market_id.clone(),
            no_price: format!("{}_no_price", market_id),
            volume: format!("{}_volume", market_id),
            short_ma: format!("{}_{}d_ma", yes_price, analytics.short_ma_window),
            long_ma: format!("{}_{}d_ma", yes_price, analytics.long_ma_window),
            pct_change: format!("{}_{}d_pct_change", yes_price, analytics.pct_change_periods),
            volatility: format!("{}_{}d_volatility", yes_price, analytics.volatility_window),
            yes_price,
        }
    }

    pub fn market_id(&self) -> &MarketId {
        &self.market_id
    }

    pub fn key(&self, field: Field) -> &str {
        match field {
            Field::YesPrice => &self.yes_price,
            Field::NoPrice => &self.no_price,
            Field::Volume => &self.volume,
            Field::ShortMa => &self.short_ma,
            Field::LongMa => &self.long_ma,
            Field::PctChange => &self.pct_change,
            Field::Volatility => &self.volatility,
        }
    }

    /// Outbound column order handed to the presentation layer.
    pub fn outbound_columns(&self) -> Vec<&str> {
        vec![
            DATE_COLUMN,
            self.key(Field::YesPrice),
            self.key(Field::NoPrice),
            self.key(Field::Volume),
            self.key(Field::ShortMa),
            self.key(Field::LongMa),
            self.key(Field::PctChange),
            self.key(Field::Volatility),
            HIGH_VOLUME_COLUMN,
        ]
    }
}
