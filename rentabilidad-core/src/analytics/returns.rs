//! Anchored cumulative return and cumulative dividends for one series.
//!
//! The anchor is the close of the first point of the input, whatever date that
//! is. A zero or non-finite anchor makes every return undefined; the series then
//! reports [`AnalyticsError::UndefinedAnchor`] as a data-quality condition
//! instead of carrying inf/NaN values.

use crate::domain::{usable_price, PriceSeries};
use crate::error::AnalyticsError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// State of the return anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Anchor {
    /// Input had no points.
    Empty,
    /// First close, usable as the reference price.
    Defined { close: f64 },
    /// First close was zero or undefined.
    Undefined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    /// `(close / anchor - 1) * 100`; `None` when the anchor or this close is undefined.
    pub cumulative_return_pct: Option<f64>,
    /// Running sum of dividends up to and including this date.
    pub cumulative_dividends: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    symbol: String,
    anchor: Anchor,
    points: Vec<ReturnPoint>,
}

impl ReturnSeries {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn points(&self) -> &[ReturnPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True unless a non-empty series has an undefined anchor.
    pub fn is_return_available(&self) -> bool {
        !matches!(self.anchor, Anchor::Undefined)
    }

    /// Data-quality condition for this series, if any.
    pub fn quality_issue(&self) -> Option<AnalyticsError> {
        (!self.is_return_available()).then(|| AnalyticsError::UndefinedAnchor {
            symbol: self.symbol.clone(),
        })
    }

    /// Cumulative return on the last date that has one.
    pub fn latest_return_pct(&self) -> Option<f64> {
        self.points.iter().rev().find_map(|p| p.cumulative_return_pct)
    }

    /// Total dividends received over the series.
    pub fn total_dividends(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.cumulative_dividends)
    }
}

/// Compute the cumulative-return series for a normalized price series.
///
/// Empty input yields an empty series with [`Anchor::Empty`].
pub fn compute_returns(series: &PriceSeries) -> ReturnSeries {
    let anchor = match series.first() {
        None => Anchor::Empty,
        Some(first) => match usable_price(first.close) {
            Some(close) => Anchor::Defined { close },
            None => Anchor::Undefined,
        },
    };

    if anchor == Anchor::Undefined {
        warn!(symbol = series.symbol(), "first close is zero or undefined; returns unavailable");
    }

    let mut running_dividends = 0.0;
    let points = series
        .points()
        .iter()
        .enumerate()
        .map(|(i, p)| {
            running_dividends += p.dividend;
            let cumulative_return_pct = match anchor {
                Anchor::Defined { .. } if i == 0 => Some(0.0),
                Anchor::Defined { close: base } if p.close.is_finite() => {
                    Some((p.close / base - 1.0) * 100.0)
                }
                _ => None,
            };
            ReturnPoint {
                date: p.date,
                cumulative_return_pct,
                cumulative_dividends: running_dividends,
            }
        })
        .collect();

    ReturnSeries {
        symbol: series.symbol().to_string(),
        anchor,
        points,
    }
}
