//! Series normalization: range filter, sort, dedupe, calendar date keys.

use crate::data::provider::RawBar;
use crate::domain::{DailyPoint, PriceSeries};
use crate::error::{check_range, AnalyticsError};
use chrono::NaiveDate;
use tracing::debug;

/// Canonicalize raw bars for one symbol into a [`PriceSeries`] over `[start, end]`.
///
/// - Timestamps are reduced to the calendar date in their own offset.
/// - Bars outside the range are dropped; none left yields an empty series.
/// - Sorting is stable and only the first bar seen for a date is kept.
/// - Missing or non-finite dividends become zero.
///
/// The input is never modified.
pub fn normalize(
    symbol: &str,
    raw: &[RawBar],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PriceSeries, AnalyticsError> {
    check_range(start, end)?;

    let mut keyed: Vec<(NaiveDate, &RawBar)> = raw
        .iter()
        .map(|bar| (bar.date(), bar))
        .filter(|(date, _)| (start..=end).contains(date))
        .collect();
    keyed.sort_by_key(|(date, _)| *date);
    keyed.dedup_by_key(|(date, _)| *date);

    let points: Vec<DailyPoint> = keyed
        .into_iter()
        .map(|(date, bar)| DailyPoint {
            date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            dividend: bar.dividend.filter(|d| d.is_finite()).unwrap_or(0.0),
        })
        .collect();

    debug!(
        symbol,
        raw = raw.len(),
        kept = points.len(),
        "normalized series"
    );

    if points.is_empty() {
        return Ok(PriceSeries::empty(symbol));
    }
    PriceSeries::new(symbol, points)
}
