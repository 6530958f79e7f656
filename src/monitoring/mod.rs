pub mod export;
pub mod logger;
#[cfg(feature = "metrics")]
pub mod metrics;
