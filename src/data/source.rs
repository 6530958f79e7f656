use crate::data::frame::MarketFrame;
use crate::data::types::{MarketDetails, MarketId, SourceError};

/// Upstream provider of market data.
///
/// Implementations hand back fresh values on every call; nothing returned
/// here is shared between requests.
pub trait MarketDataSource: Send + Sync {
    fn market_details(&self, market_id: &MarketId) -> Result<MarketDetails, SourceError>;

    /// Daily history covering `days` calendar days. May be empty.
    fn historical_prices(&self, market_id: &MarketId, days: usize)
        -> Result<MarketFrame, SourceError>;
}
