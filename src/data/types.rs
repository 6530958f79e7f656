use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static MARKET_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.\-]*$").expect("market id pattern is valid")
});

/// Identifier of a single prediction market, e.g. `market1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MarketId(String);

impl MarketId {
    pub fn parse(raw: &str) -> Result<Self, SourceError> {
        let trimmed = raw.trim();
        if !MARKET_ID_PATTERN.is_match(trimmed) {
            return Err(SourceError::InvalidMarketId(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for MarketId {
    type Error = SourceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MarketId> for String {
    fn from(id: MarketId) -> Self {
        id.0
    }
}

/// Lookup-panel record for one market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDetails {
    pub id: MarketId,
    pub name: String,
    pub category: String,
    pub current_yes_price: f64,
    pub current_no_price: f64,
    pub liquidity_usd: f64,
    pub volume_24h_usd: f64,
    pub resolution_date: NaiveDate,
    pub description: String,
    pub warning: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Invalid market id: {0:?}")]
    InvalidMarketId(String),

    #[error("Market data unavailable for {market}: {reason}")]
    Unavailable { market: String, reason: String },

    #[error("Invalid distribution parameters: {0}")]
    Distribution(String),
}
