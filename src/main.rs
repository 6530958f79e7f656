mod cli;

use anyhow::Result;
use clap::Parser;
use futures::future::join_all;
use std::sync::Arc;

use cli::Cli;
use polymarket_insight::config::{Config, EnvConfig};
use polymarket_insight::data::mock_source::MockMarketSource;
use polymarket_insight::data::source::MarketDataSource;
use polymarket_insight::monitoring;
use polymarket_insight::request::{handle_request, OutputFormat};

#[tokio::main]
async fn main() -> Result<()> {
    monitoring::logger::init_logger("polymarket-insight");

    let cli = Cli::parse();
    let env_config = EnvConfig::load()?;

    tracing::info!("Polymarket Insight Engine starting (MOCK DATA ONLY)");

    let config_path = cli.config.clone().unwrap_or(env_config.config_path);
    let config = Arc::new(Config::load_or_default(&config_path)?);

    let days = cli
        .days
        .or(env_config.history_days)
        .unwrap_or(config.system.history_days);
    let format = if cli.json { OutputFormat::Json } else { OutputFormat::Text };

    let mut mock = MockMarketSource::new(config.analytics.clone());
    if let Some(seed) = cli.seed.or(env_config.mock_seed) {
        tracing::info!("Mock data seed: {}", seed);
        mock = mock.with_seed(seed);
    }
    let source: Arc<dyn MarketDataSource> = Arc::new(mock);

    let markets = if cli.markets.is_empty() {
        config.system.default_markets.clone()
    } else {
        cli.markets
    };
    tracing::info!("Fetching {} market(s), {} days of history", markets.len(), days);

    // Each market is an independent request; nothing is shared between them.
    let requests = markets.into_iter().map(|market| {
        let source = Arc::clone(&source);
        let config = Arc::clone(&config);
        tokio::task::spawn_blocking(move || {
            let result = handle_request(source.as_ref(), &config, &market, days, format);
            (market, result)
        })
    });

    let mut failures = 0usize;
    for joined in join_all(requests).await {
        match joined {
            Ok((_, Ok(view))) => println!("{}", view),
            Ok((market, Err(e))) => {
                tracing::error!("Request for {} failed: {:#}", market, e);
                failures += 1;
            }
            Err(e) => {
                tracing::error!("Request task panicked: {}", e);
                failures += 1;
            }
        }
    }

    #[cfg(feature = "metrics")]
    tracing::debug!("Metrics:\n{}", monitoring::metrics::render());

    if failures > 0 {
        tracing::warn!("{} request(s) failed", failures);
    }
    tracing::info!("Done");

    Ok(())
}
