//! Calendar-month resampling of a daily series.
//!
//! Aggregation per month: last close, sum of dividends, and the change in
//! cumulative return between the month's first and last point. Months without
//! observations between the first and last month present are forward-filled
//! from the previous month. This fill only ever looks at the series' own
//! calendar; cross-asset alignment lives in [`super::align`] and never fills.

use super::returns::{Anchor, ReturnSeries};
use crate::domain::calendar::{month_end, month_start, months_between};
use crate::domain::{usable_price, PriceSeries};
use crate::error::AnalyticsError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One day of the fused view consumed by the resampler.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyView {
    pub date: NaiveDate,
    pub close: f64,
    pub dividend: f64,
    pub cumulative_return_pct: Option<f64>,
}

/// Join a price series with its return series by date.
pub fn fuse(prices: &PriceSeries, returns: &ReturnSeries) -> Vec<DailyView> {
    prices
        .points()
        .iter()
        .zip(returns.points())
        .filter(|(p, r)| p.date == r.date)
        .map(|(p, r)| DailyView {
            date: p.date,
            close: p.close,
            dividend: p.dividend,
            cumulative_return_pct: r.cumulative_return_pct,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyEntry {
    /// First day of the month (the partition key).
    pub month: NaiveDate,
    /// Last calendar day of the month.
    pub period_end: NaiveDate,
    /// Close of the latest observation with a finite close, else carried forward.
    pub last_close: Option<f64>,
    pub period_return_delta: Option<f64>,
    pub dividend_sum: f64,
    /// `(last_close / first month's last_close - 1) * 100`.
    pub cumulative_return_pct_from_start: Option<f64>,
    /// True for months synthesized by forward-fill.
    pub filled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResampledSeries {
    symbol: String,
    /// First month's last close, the base of `cumulative_return_pct_from_start`.
    anchor: Anchor,
    entries: Vec<MonthlyEntry>,
}

impl ResampledSeries {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn entries(&self) -> &[MonthlyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The latest month: the canonical figure for the whole window.
    pub fn window_total(&self) -> Option<&MonthlyEntry> {
        self.entries.last()
    }

    /// Total return for the window, from the latest month.
    pub fn total_return_pct(&self) -> Option<f64> {
        self.window_total()
            .and_then(|e| e.cumulative_return_pct_from_start)
    }

    /// Data-quality condition when the monthly curve has no usable base.
    ///
    /// Raised even when the daily anchor was defined: a first month closing at
    /// zero leaves every from-start value undefined.
    pub fn quality_issue(&self) -> Option<AnalyticsError> {
        match (self.anchor, self.entries.first()) {
            (Anchor::Undefined, Some(first)) => Some(AnalyticsError::UndefinedMonthlyAnchor {
                symbol: self.symbol.clone(),
                month: first.month,
            }),
            _ => None,
        }
    }

    /// Dividends summed over every month.
    pub fn total_dividends(&self) -> f64 {
        self.entries.iter().map(|e| e.dividend_sum).sum()
    }
}

/// Resample a price series and its returns by calendar month.
pub fn resample_monthly(prices: &PriceSeries, returns: &ReturnSeries) -> ResampledSeries {
    resample_view(
        prices.symbol(),
        &fuse(prices, returns),
        returns.is_return_available(),
    )
}

/// Resample an already fused daily view.
///
/// `returns_available` is false when the daily series had an undefined anchor;
/// every return column is then left undefined.
pub fn resample_view(symbol: &str, days: &[DailyView], returns_available: bool) -> ResampledSeries {
    let (first, last) = match (days.first(), days.last()) {
        (Some(f), Some(l)) => (f.date, l.date),
        _ => {
            return ResampledSeries {
                symbol: symbol.to_string(),
                anchor: Anchor::Empty,
                entries: Vec::new(),
            }
        }
    };

    let mut by_month: BTreeMap<NaiveDate, Vec<&DailyView>> = BTreeMap::new();
    for day in days {
        by_month.entry(month_start(day.date)).or_default().push(day);
    }

    let mut entries: Vec<MonthlyEntry> = Vec::new();
    for month in months_between(first, last) {
        let previous_close = entries.last().and_then(|e| e.last_close);
        let entry = match by_month.get(&month) {
            Some(month_days) => {
                let last_close = month_days
                    .iter()
                    .rev()
                    .map(|d| d.close)
                    .find(|c| c.is_finite())
                    .or(previous_close);
                let period_return_delta = match (month_days.first(), month_days.last()) {
                    (Some(a), Some(b)) if returns_available => b
                        .cumulative_return_pct
                        .zip(a.cumulative_return_pct)
                        .map(|(end, start)| end - start),
                    _ => None,
                };
                MonthlyEntry {
                    month,
                    period_end: month_end(month),
                    last_close,
                    period_return_delta,
                    dividend_sum: month_days.iter().map(|d| d.dividend).sum(),
                    cumulative_return_pct_from_start: None,
                    filled: false,
                }
            }
            None => MonthlyEntry {
                month,
                period_end: month_end(month),
                last_close: previous_close,
                period_return_delta: returns_available.then_some(0.0),
                dividend_sum: 0.0,
                cumulative_return_pct_from_start: None,
                filled: true,
            },
        };
        entries.push(entry);
    }

    // The monthly curve is re-anchored on its own first month.
    let base = entries
        .first()
        .and_then(|e| e.last_close)
        .and_then(usable_price)
        .filter(|_| returns_available);
    let anchor = match base {
        Some(base) => {
            for entry in &mut entries {
                entry.cumulative_return_pct_from_start =
                    entry.last_close.map(|close| (close / base - 1.0) * 100.0);
            }
            Anchor::Defined { close: base }
        }
        None => Anchor::Undefined,
    };

    ResampledSeries {
        symbol: symbol.to_string(),
        anchor,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::returns::compute_returns;
    use crate::domain::DailyPoint;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn series(rows: &[(&str, f64, f64)]) -> PriceSeries {
        let points = rows
            .iter()
            .map(|&(date, close, dividend)| DailyPoint {
                date: d(date),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1,
                dividend,
            })
            .collect();
        PriceSeries::new("A", points).unwrap()
    }

    fn resample(prices: &PriceSeries) -> ResampledSeries {
        resample_monthly(prices, &compute_returns(prices))
    }

    #[test]
    fn aggregates_per_month() {
        let prices = series(&[
            ("2024-01-02", 100.0, 0.0),
            ("2024-01-15", 105.0, 0.3),
            ("2024-01-31", 110.0, 0.0),
            ("2024-02-01", 108.0, 0.2),
            ("2024-02-29", 120.0, 0.0),
        ]);
        let monthly = resample(&prices);
        assert_eq!(monthly.len(), 2);

        let jan = &monthly.entries()[0];
        assert_eq!(jan.period_end, d("2024-01-31"));
        assert_eq!(jan.last_close, Some(110.0));
        assert!((jan.dividend_sum - 0.3).abs() < 1e-12);
        assert!((jan.period_return_delta.unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(jan.cumulative_return_pct_from_start, Some(0.0));

        let feb = &monthly.entries()[1];
        assert_eq!(feb.period_end, d("2024-02-29"));
        assert!((feb.period_return_delta.unwrap() - 12.0).abs() < 1e-9);
        let expected = (120.0 / 110.0 - 1.0) * 100.0;
        assert!((feb.cumulative_return_pct_from_start.unwrap() - expected).abs() < 1e-9);
        assert!((monthly.total_return_pct().unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn forward_fills_gap_months() {
        let prices = series(&[
            ("2024-01-31", 50.0, 0.0),
            ("2024-04-01", 60.0, 1.0),
        ]);
        let monthly = resample(&prices);
        let months: Vec<NaiveDate> = monthly.entries().iter().map(|e| e.month).collect();
        assert_eq!(
            months,
            vec![d("2024-01-01"), d("2024-02-01"), d("2024-03-01"), d("2024-04-01")]
        );
        for filled in &monthly.entries()[1..3] {
            assert!(filled.filled);
            assert_eq!(filled.last_close, Some(50.0));
            assert_eq!(filled.period_return_delta, Some(0.0));
            assert_eq!(filled.dividend_sum, 0.0);
            assert_eq!(filled.cumulative_return_pct_from_start, Some(0.0));
        }
        assert!(!monthly.entries()[3].filled);
        assert_eq!(monthly.total_dividends(), 1.0);
    }

    #[test]
    fn single_point_month_has_zero_delta() {
        let prices = series(&[("2024-01-02", 10.0, 0.0), ("2024-02-05", 12.0, 0.0)]);
        let monthly = resample(&prices);
        assert_eq!(monthly.entries()[1].period_return_delta, Some(0.0));
    }

    #[test]
    fn empty_series_resamples_to_empty() {
        let prices = PriceSeries::empty("A");
        let monthly = resample(&prices);
        assert!(monthly.is_empty());
        assert!(monthly.window_total().is_none());
        assert!(monthly.total_return_pct().is_none());
    }

    #[test]
    fn zero_anchor_leaves_returns_undefined() {
        let prices = series(&[
            ("2024-01-02", 0.0, 0.0),
            ("2024-01-03", 10.0, 0.0),
            ("2024-03-01", 12.0, 0.0),
        ]);
        let monthly = resample(&prices);
        for entry in monthly.entries() {
            assert!(entry.period_return_delta.is_none());
            assert!(entry.cumulative_return_pct_from_start.is_none());
            if let Some(close) = entry.last_close {
                assert!(close.is_finite());
            }
        }
        assert_eq!(monthly.entries()[1].last_close, Some(10.0));
    }

    #[test]
    fn month_closing_at_zero_is_a_quality_issue() {
        let prices = series(&[
            ("2024-01-02", 100.0, 0.0),
            ("2024-01-31", 0.0, 0.0),
            ("2024-02-05", 120.0, 0.0),
        ]);
        let returns = compute_returns(&prices);
        assert!(returns.quality_issue().is_none());

        let monthly = resample_monthly(&prices, &returns);
        assert_eq!(monthly.anchor(), Anchor::Undefined);
        assert!(monthly
            .entries()
            .iter()
            .all(|e| e.cumulative_return_pct_from_start.is_none()));
        assert_eq!(
            monthly.quality_issue(),
            Some(AnalyticsError::UndefinedMonthlyAnchor {
                symbol: "A".into(),
                month: d("2024-01-01"),
            })
        );
    }

    #[test]
    fn usable_first_month_defines_the_anchor() {
        let prices = series(&[("2024-01-02", 10.0, 0.0), ("2024-02-05", 12.0, 0.0)]);
        let monthly = resample(&prices);
        assert_eq!(monthly.anchor(), Anchor::Defined { close: 10.0 });
        assert!(monthly.quality_issue().is_none());
        assert_eq!(resample(&series(&[])).anchor(), Anchor::Empty);
    }

    #[test]
    fn nan_month_close_is_carried_forward() {
        let prices = series(&[
            ("2024-01-02", 10.0, 0.0),
            ("2024-02-01", f64::NAN, 0.0),
            ("2024-03-01", 11.0, 0.0),
        ]);
        let monthly = resample(&prices);
        assert_eq!(monthly.entries()[1].last_close, Some(10.0));
        assert!(!monthly.entries()[1].filled);
        assert!(monthly.entries()[1].period_return_delta.is_none());
    }

    #[test]
    fn fuse_keeps_matching_dates() {
        let prices = series(&[("2024-01-02", 10.0, 0.1), ("2024-01-03", 11.0, 0.0)]);
        let view = fuse(&prices, &compute_returns(&prices));
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].dividend, 0.1);
        assert_eq!(view[1].cumulative_return_pct.map(|r| r.round()), Some(10.0));
    }
}
