//! Rentabilidad Core: historical returns, dividends and monthly savings for equities.
//!
//! This crate contains:
//! - Domain types (daily points, price series, month calendar)
//! - Provider seam with Yahoo Finance, CSV, synthetic and in-memory sources
//! - Company directory resolving display names to tickers
//! - Normalizer, anchored cumulative returns, monthly resampling
//! - Savings plan with per-asset unit accumulation (`ahorro_dividido`)
//! - Multi-asset alignment into one consolidated table
//! - The end-to-end `analyze` entry point

pub mod analytics;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod report;

pub use config::{AnalysisConfig, AnalysisRequest, ConfigError};
pub use error::AnalyticsError;
pub use report::{analyze, AnalysisReport, AssetReport};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything crossing the rayon fan-out is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PriceSeries>();
        require_sync::<domain::PriceSeries>();
        require_send::<analytics::ReturnSeries>();
        require_sync::<analytics::ReturnSeries>();
        require_send::<analytics::ResampledSeries>();
        require_sync::<analytics::ResampledSeries>();
        require_send::<analytics::SavingsPlan>();
        require_sync::<analytics::SavingsPlan>();
        require_send::<analytics::UnitsSeries>();
        require_sync::<analytics::UnitsSeries>();
        require_send::<AssetReport>();
        require_sync::<AssetReport>();
        require_send::<AnalyticsError>();
        require_sync::<AnalyticsError>();

        require_sync::<data::SymbolDirectory>();
        require_sync::<data::YahooProvider>();
        require_sync::<data::CsvProvider>();
        require_sync::<data::RetryingProvider<data::YahooProvider>>();
    }

    /// The provider seam is object safe.
    #[test]
    fn provider_trait_is_object_safe() {
        let provider: Box<dyn data::MarketDataProvider> = Box::new(data::InMemoryProvider::new());
        assert_eq!(provider.source(), data::DataSource::InMemory);
    }
}
