//! Market-data provider trait and structured error types.
//!
//! The MarketDataProvider trait abstracts over data sources (Yahoo Finance, CSV
//! import, synthetic, in-memory) so the analytics pipeline can swap
//! implementations and mock them in tests.

use crate::error::AnalyticsError;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Raw daily bar from a provider, before normalization.
///
/// The timestamp keeps whatever offset the provider reported; the normalizer
/// reduces it to a calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub timestamp: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub dividend: Option<f64>,
}

impl RawBar {
    /// Calendar date in the provider's own offset.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Structured provider errors.
///
/// `Unavailable` and `RateLimited` are transient and may be retried;
/// the others are final for the requested symbol.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no data for '{symbol}' in the requested range")]
    NoDataInRange { symbol: String },

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),
}

impl ProviderError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::RateLimited { .. })
    }

    /// Map into the analytics taxonomy for the symbol being analyzed.
    pub fn into_analytics(self, symbol: &str, start: NaiveDate, end: NaiveDate) -> AnalyticsError {
        match self {
            Self::SymbolNotFound { .. } => AnalyticsError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Self::NoDataInRange { .. } => AnalyticsError::EmptyHistory {
                symbol: symbol.to_string(),
                start,
                end,
            },
            other => AnalyticsError::ProviderUnavailable {
                symbol: symbol.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Synthetic,
    InMemory,
}

/// Trait for market-data providers.
///
/// `fetch` returns bars whose dates fall in `[start, end]`, or fails with a
/// [`ProviderError`]. Implementations must bound the time a single call can take.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Where the bars come from.
    fn source(&self) -> DataSource;

    /// Fetch daily bars with dividends for a symbol over a date range.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<RawBar>, ProviderError>;
}

/// Provider over fixed per-symbol bars held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    bars: HashMap<String, Vec<RawBar>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bars for a symbol, replacing any previous ones.
    pub fn with_symbol(mut self, symbol: impl Into<String>, bars: Vec<RawBar>) -> Self {
        self.bars.insert(symbol.into(), bars);
        self
    }
}

impl MarketDataProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "in_memory"
    }

    fn source(&self) -> DataSource {
        DataSource::InMemory
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>, ProviderError> {
        let bars = self
            .bars
            .get(symbol)
            .ok_or_else(|| ProviderError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;
        Ok(bars
            .iter()
            .filter(|b| (start..=end).contains(&b.date()))
            .cloned()
            .collect())
    }
}
