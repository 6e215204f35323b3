//! Synthetic provider for offline runs and benchmarks.
//!
//! Produces a seeded random walk on weekdays starting at 100.0, with a small
//! dividend on the first trading day of March, June, September and December.
//! The same (seed, symbol, range) always yields the same bars.

use super::provider::{DataSource, MarketDataProvider, ProviderError, RawBar};
use chrono::{Datelike, NaiveDate, NaiveTime, Offset, TimeZone, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    seed: u64,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn symbol_seed(&self, symbol: &str) -> u64 {
        let hash = blake3::hash(symbol.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        self.seed ^ u64::from_le_bytes(bytes)
    }
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Generate one seeded walk of weekday bars over `[start, end]`.
pub fn generate_bars(seed: u64, start: NaiveDate, end: NaiveDate) -> Vec<RawBar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let offset = Utc.fix();
    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut last_dividend_month = None;

    for date in start.iter_days().take_while(|d| *d <= end) {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }
        let change: f64 = rng.gen_range(-0.02..0.02);
        let open = price;
        let close = (price * (1.0 + change)).max(1.0);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(100_000..5_000_000u64);

        let is_dividend_month = date.month() % 3 == 0;
        let dividend = if is_dividend_month && last_dividend_month != Some((date.year(), date.month())) {
            last_dividend_month = Some((date.year(), date.month()));
            Some((close * 0.005 * 100.0).round() / 100.0)
        } else {
            None
        };

        bars.push(RawBar {
            timestamp: offset.from_utc_datetime(&date.and_time(NaiveTime::MIN)),
            open,
            high,
            low,
            close,
            volume,
            dividend,
        });
        price = close;
    }

    bars
}

impl MarketDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>, ProviderError> {
        let bars = generate_bars(self.symbol_seed(symbol), start, end);
        if bars.is_empty() {
            return Err(ProviderError::NoDataInRange {
                symbol: symbol.to_string(),
            });
        }
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn deterministic_per_symbol() {
        let p = SyntheticProvider::new(7);
        let a1 = p.fetch("AAPL", d("2024-01-01"), d("2024-03-31")).unwrap();
        let a2 = p.fetch("AAPL", d("2024-01-01"), d("2024-03-31")).unwrap();
        let b = p.fetch("MSFT", d("2024-01-01"), d("2024-03-31")).unwrap();
        assert_eq!(a1, a2);
        assert_ne!(a1[5].close, b[5].close);
    }

    #[test]
    fn weekdays_only_and_quarterly_dividend() {
        let bars = generate_bars(1, d("2024-03-01"), d("2024-03-31"));
        assert!(bars
            .iter()
            .all(|b| !matches!(b.date().weekday(), Weekday::Sat | Weekday::Sun)));
        assert_eq!(bars.iter().filter(|b| b.dividend.is_some()).count(), 1);
        assert!(bars[0].dividend.is_some());
    }

    #[test]
    fn weekend_only_range_is_no_data() {
        let p = SyntheticProvider::default();
        assert!(matches!(
            p.fetch("A", d("2024-01-06"), d("2024-01-07")),
            Err(ProviderError::NoDataInRange { .. })
        ));
    }
}
