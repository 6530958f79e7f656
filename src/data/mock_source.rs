use chrono::{Days, Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::{debug, warn};

use crate::config::AnalyticsConfig;
use crate::data::frame::{MarketFrame, Observation};
use crate::data::schema::MarketSchema;
use crate::data::source::MarketDataSource;
use crate::data::types::{MarketDetails, MarketId, SourceError};

const DAILY_PRICE_STD_DEV: f64 = 0.03;
const VOLUME_SPIKE_PROBABILITY: f64 = 0.10;
const MIN_PRICE: f64 = 0.01;
const MAX_PRICE: f64 = 0.99;

const CATEGORIES: [&str; 7] = [
    "Politics",
    "Crypto",
    "Sports",
    "Technology",
    "Science",
    "Climate",
    "Entertainment",
];

struct CatalogEntry {
    id: &'static str,
    name: &'static str,
    category: &'static str,
    base_yes: f64,
    volatility: f64,
}

const CATALOG: [CatalogEntry; 5] = [
    CatalogEntry {
        id: "market1",
        name: "Will AI achieve AGI by 2030?",
        category: "Technology",
        base_yes: 0.30,
        volatility: 0.10,
    },
    CatalogEntry {
        id: "market2",
        name: "Who will win the next US Presidential Election?",
        category: "Politics",
        base_yes: 0.50,
        volatility: 0.15,
    },
    CatalogEntry {
        id: "market3",
        name: "Will Ethereum reach $10,000 by EOY?",
        category: "Crypto",
        base_yes: 0.15,
        volatility: 0.20,
    },
    CatalogEntry {
        id: "market4",
        name: "Will fusion power be commercially viable by 2040?",
        category: "Science",
        base_yes: 0.20,
        volatility: 0.08,
    },
    CatalogEntry {
        id: "market5",
        name: "Will global temperatures rise >2°C by 2050?",
        category: "Climate",
        base_yes: 0.65,
        volatility: 0.05,
    },
];

/// Simulated market data provider. THIS IS MOCK DATA, no real prices.
///
/// Every call draws from its own RNG. With a seed the output is reproducible
/// per market id; without one it is seeded from entropy.
#[derive(Debug, Clone)]
pub struct MockMarketSource {
    analytics: AnalyticsConfig,
    seed: Option<u64>,
    end_date: Option<NaiveDate>,
}

impl MockMarketSource {
    pub fn new(analytics: AnalyticsConfig) -> Self {
        Self {
            analytics,
            seed: None,
            end_date: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Pin the last generated day. Defaults to yesterday.
    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    fn rng_for(&self, market_id: &MarketId, salt: u64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ id_checksum(market_id) ^ salt),
            None => StdRng::from_entropy(),
        }
    }

    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    /// Random walk of daily observations ending at the configured end date.
    pub fn generate_observations(
        &self,
        market_id: &MarketId,
        days: usize,
    ) -> Result<Vec<Observation>, SourceError> {
        if days == 0 {
            return Ok(Vec::new());
        }

        let mut rng = self.rng_for(market_id, 0x9e37_79b9);
        let step = Normal::new(0.0, DAILY_PRICE_STD_DEV)
            .map_err(|e| SourceError::Distribution(e.to_string()))?;

        let end = self.end_date.unwrap_or_else(|| self.today() - Duration::days(1));
        let start = u64::try_from(days - 1)
            .ok()
            .and_then(|span| end.checked_sub_days(Days::new(span)))
            .ok_or_else(|| SourceError::Unavailable {
                market: market_id.to_string(),
                reason: format!("{} days of history reaches past the supported date range", days),
            })?;

        let mut yes_price = starting_price(market_id);
        let mut observations = Vec::with_capacity(days);

        for offset in 0..days {
            let volume = if rng.gen::<f64>() < VOLUME_SPIKE_PROBABILITY {
                rng.gen_range(2000..15000u32)
            } else {
                rng.gen_range(100..2000u32)
            };

            observations.push(Observation {
                date: start + Days::new(offset as u64),
                yes_price,
                no_price: round_cents(1.0 - yes_price),
                volume: f64::from(volume),
            });

            yes_price = round_cents((yes_price + step.sample(&mut rng)).clamp(MIN_PRICE, MAX_PRICE));
        }

        Ok(observations)
    }
}

impl MarketDataSource for MockMarketSource {
    fn market_details(&self, market_id: &MarketId) -> Result<MarketDetails, SourceError> {
        let mut rng = self.rng_for(market_id, 0x85eb_ca6b);
        let today = self.today();

        let details = match CATALOG.iter().find(|entry| entry.id == market_id.as_str()) {
            Some(entry) => {
                let jitter = rng.gen_range(-entry.volatility..=entry.volatility);
                let yes = round_cents((entry.base_yes + jitter).clamp(MIN_PRICE, MAX_PRICE));

                MarketDetails {
                    id: market_id.clone(),
                    name: entry.name.to_string(),
                    category: entry.category.to_string(),
                    current_yes_price: yes,
                    current_no_price: round_cents(1.0 - yes),
                    liquidity_usd: f64::from(rng.gen_range(5_000..=2_000_000u32)),
                    volume_24h_usd: f64::from(rng.gen_range(1_000..=50_000u32)),
                    resolution_date: today + Duration::days(rng.gen_range(10..=730)),
                    description: format!(
                        "This is a mock description for the market '{}'. Resolution criteria and other details would go here in a real market.",
                        entry.name
                    ),
                    warning: None,
                }
            }
            None => {
                warn!("Market {} is not catalogued, using generic mock data", market_id);
                let yes = round_cents(rng.gen_range(0.05..0.95));
                let category = CATEGORIES.choose(&mut rng).copied().unwrap_or("Politics");

                MarketDetails {
                    id: market_id.clone(),
                    name: format!("Mock Market: {} (Generic)", market_id),
                    category: category.to_string(),
                    current_yes_price: yes,
                    current_no_price: round_cents(1.0 - yes),
                    liquidity_usd: f64::from(rng.gen_range(1_000..=100_000u32)),
                    volume_24h_usd: f64::from(rng.gen_range(100..=10_000u32)),
                    resolution_date: today + Duration::days(rng.gen_range(30..=365)),
                    description: "This is a generic mock market. Enter a known ID like 'market1' for more specific mock data.".to_string(),
                    warning: Some(
                        "Using generic mock data as market_id was not predefined.".to_string(),
                    ),
                }
            }
        };

        Ok(details)
    }

    fn historical_prices(
        &self,
        market_id: &MarketId,
        days: usize,
    ) -> Result<MarketFrame, SourceError> {
        let observations = self.generate_observations(market_id, days)?;
        debug!("Generated {} mock observations for {}", observations.len(), market_id);

        let schema = MarketSchema::new(market_id, &self.analytics);
        Ok(MarketFrame::from_observations(&schema, &observations))
    }
}

fn id_checksum(market_id: &MarketId) -> u64 {
    market_id.as_str().chars().map(|c| c as u64).sum()
}

/// Starting yes price in [0.1, 0.9], stable per market id.
fn starting_price(market_id: &MarketId) -> f64 {
    let seed_val = (id_checksum(market_id) % 100) as f64 / 100.0;
    (seed_val * 0.8 + 0.1).clamp(0.1, 0.9)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
