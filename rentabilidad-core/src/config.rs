//! Request parameters and the TOML analysis config.

use crate::data::RetryPolicy;
use crate::error::{check_range, AnalyticsError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// The user parameter set for one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Company display names or tickers, in request order.
    pub symbols: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub monthly_amount: f64,
}

impl AnalysisRequest {
    pub fn new(
        symbols: impl IntoIterator<Item = impl Into<String>>,
        start: NaiveDate,
        end: NaiveDate,
        monthly_amount: f64,
    ) -> Self {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
            start,
            end,
            monthly_amount,
        }
    }

    /// Precondition checks, run before any retrieval.
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        check_range(self.start, self.end)?;
        if !self.monthly_amount.is_finite() || self.monthly_amount < 0.0 {
            return Err(AnalyticsError::InvalidAmount {
                amount: self.monthly_amount,
            });
        }
        Ok(())
    }

    /// Trimmed, non-empty symbols with duplicates removed, first occurrence kept.
    pub fn unique_symbols(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.symbols
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty() && seen.insert(*s))
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("parse config: {0}")]
    Parse(String),
}

/// `[analysis]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSection {
    pub symbols: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub monthly_amount: f64,
}

/// `[provider]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for ProviderSection {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            timeout_secs: 30,
            max_retries: retry.max_retries,
            base_delay_ms: retry.base_delay.as_millis() as u64,
        }
    }
}

impl ProviderSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
        }
    }
}

/// `[directory]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectorySection {
    pub path: PathBuf,
}

/// Analysis config file.
///
/// ```toml
/// [analysis]
/// symbols = ["AAPL", "Microsoft"]
/// start_date = "2023-01-01"
/// end_date = "2023-12-31"
/// monthly_amount = 100.0
///
/// [provider]
/// timeout_secs = 30
/// max_retries = 3
/// base_delay_ms = 500
///
/// [directory]
/// path = "sp500.csv"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub analysis: AnalysisSection,
    #[serde(default)]
    pub provider: ProviderSection,
    #[serde(default)]
    pub directory: Option<DirectorySection>,
}

impl AnalysisConfig {
    /// Load config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn request(&self) -> AnalysisRequest {
        AnalysisRequest::new(
            self.analysis.symbols.iter().cloned(),
            self.analysis.start_date,
            self.analysis.end_date,
            self.analysis.monthly_amount,
        )
    }
}
