//! CSV history import: offline provider over `<dir>/<SYMBOL>.csv` files.
//!
//! Expected header: `Date,Open,High,Low,Close,Volume,Dividends`. `Date` is either
//! a plain `YYYY-MM-DD` or a timestamp with offset (`2024-01-02 00:00:00-05:00`).
//! Extra columns are ignored and `Dividends` may be missing.

use super::provider::{DataSource, MarketDataProvider, ProviderError, RawBar};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: Option<f64>,
    #[serde(rename = "High")]
    high: Option<f64>,
    #[serde(rename = "Low")]
    low: Option<f64>,
    #[serde(rename = "Close")]
    close: Option<f64>,
    #[serde(rename = "Volume")]
    volume: Option<f64>,
    #[serde(rename = "Dividends", default)]
    dividends: Option<f64>,
}

/// Provider reading one CSV file per symbol from a directory.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    /// Parse every row of a history file.
    pub fn read_file(path: &Path) -> Result<Vec<RawBar>, ProviderError> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| ProviderError::Unavailable(format!("open {}: {e}", path.display())))?;

        let mut bars = Vec::new();
        for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
            let row = row.map_err(|e| {
                ProviderError::ResponseFormatChanged(format!("{} row {}: {e}", path.display(), line + 1))
            })?;
            let timestamp = parse_timestamp(&row.date).ok_or_else(|| {
                ProviderError::ResponseFormatChanged(format!(
                    "{} row {}: bad date '{}'",
                    path.display(),
                    line + 1,
                    row.date
                ))
            })?;
            bars.push(RawBar {
                timestamp,
                open: row.open.unwrap_or(f64::NAN),
                high: row.high.unwrap_or(f64::NAN),
                low: row.low.unwrap_or(f64::NAN),
                close: row.close.unwrap_or(f64::NAN),
                volume: row
                    .volume
                    .filter(|v| v.is_finite() && *v >= 0.0)
                    .map(|v| v as u64)
                    .unwrap_or(0),
                dividend: row.dividends.filter(|d| *d != 0.0),
            });
        }
        Ok(bars)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%dT%H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%z"] {
        if let Ok(ts) = DateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| Utc.fix().from_utc_datetime(&d.and_time(NaiveTime::MIN)))
}

impl MarketDataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn source(&self) -> DataSource {
        DataSource::CsvImport
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>, ProviderError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(ProviderError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        let bars: Vec<RawBar> = Self::read_file(&path)?
            .into_iter()
            .filter(|b| (start..=end).contains(&b.date()))
            .collect();

        if bars.is_empty() {
            return Err(ProviderError::NoDataInRange {
                symbol: symbol.to_string(),
            });
        }
        Ok(bars)
    }
}
