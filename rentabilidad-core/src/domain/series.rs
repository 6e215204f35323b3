//! DailyPoint and PriceSeries: the normalized market data unit.

use crate::error::AnalyticsError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day for a single symbol.
///
/// `dividend` is the cash amount paid on this date, zero when there was none.
/// Prices may be NaN when the provider reported a partial bar; consumers decide
/// how to treat them (see [`usable_price`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub dividend: f64,
}

impl DailyPoint {
    /// Returns true if any OHLC field is NaN.
    pub fn is_partial(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }
}

/// A price is usable as a divisor when it is finite and non-zero.
pub fn usable_price(value: f64) -> Option<f64> {
    (value.is_finite() && value != 0.0).then_some(value)
}

/// Ordered daily points for one symbol. Dates are unique and strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<DailyPoint>,
}

impl PriceSeries {
    /// Build a series, rejecting points that are not strictly increasing by date.
    pub fn new(symbol: impl Into<String>, points: Vec<DailyPoint>) -> Result<Self, AnalyticsError> {
        let symbol = symbol.into();
        if let Some(pair) = points.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(AnalyticsError::UnorderedDates {
                symbol,
                date: pair[1].date,
            });
        }
        Ok(Self { symbol, points })
    }

    /// An explicitly empty series (no observations in range).
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            points: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[DailyPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&DailyPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&DailyPoint> {
        self.points.last()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    /// Point observed on exactly `date`, if any.
    pub fn get(&self, date: NaiveDate) -> Option<&DailyPoint> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| &self.points[i])
    }

    /// Index of the first point dated on or after `date`.
    pub fn first_index_on_or_after(&self, date: NaiveDate) -> Option<usize> {
        let idx = self.points.partition_point(|p| p.date < date);
        (idx < self.points.len()).then_some(idx)
    }

    /// Last close that is usable as a valuation price.
    pub fn last_usable_close(&self) -> Option<f64> {
        self.points.iter().rev().find_map(|p| usable_price(p.close))
    }
}
