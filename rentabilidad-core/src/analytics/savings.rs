//! Fixed-amount monthly savings (dollar-cost averaging) simulation.
//!
//! The plan's schedule starts on the window start and then recurs on every
//! following month start up to the window end. Each contribution buys at the
//! close of the asset's first trading day on or after the contribution date.
//! A contribution whose buying close is zero or undefined is skipped and never
//! enters the running unit count.

use crate::domain::calendar::next_month_start;
use crate::domain::{usable_price, PriceSeries};
use crate::error::{check_range, AnalyticsError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsPlan {
    monthly_amount: f64,
    schedule: Vec<NaiveDate>,
}

/// One schedule date with the contribution totals up to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionPoint {
    pub date: NaiveDate,
    pub amount: f64,
    pub cumulative: f64,
}

impl SavingsPlan {
    /// Monthly plan over `[start, end]`.
    pub fn monthly(monthly_amount: f64, start: NaiveDate, end: NaiveDate) -> Result<Self, AnalyticsError> {
        check_range(start, end)?;
        let mut schedule = vec![start];
        let mut next = next_month_start(start);
        while let Some(date) = next.filter(|d| *d <= end) {
            schedule.push(date);
            next = next_month_start(date);
        }
        Self::with_schedule(monthly_amount, schedule)
    }

    /// Plan over an explicit schedule. Dates are sorted and de-duplicated.
    pub fn with_schedule(monthly_amount: f64, mut schedule: Vec<NaiveDate>) -> Result<Self, AnalyticsError> {
        if !monthly_amount.is_finite() || monthly_amount < 0.0 {
            return Err(AnalyticsError::InvalidAmount {
                amount: monthly_amount,
            });
        }
        schedule.sort_unstable();
        schedule.dedup();
        Ok(Self {
            monthly_amount,
            schedule,
        })
    }

    pub fn monthly_amount(&self) -> f64 {
        self.monthly_amount
    }

    pub fn schedule(&self) -> &[NaiveDate] {
        &self.schedule
    }

    /// Number of schedule dates on or before `date`.
    pub fn contributions_until(&self, date: NaiveDate) -> usize {
        self.schedule.partition_point(|s| *s <= date)
    }

    /// `monthly_amount × |{s ≤ date}|`.
    pub fn cumulative_contribution(&self, date: NaiveDate) -> f64 {
        self.monthly_amount * self.contributions_until(date) as f64
    }

    /// Contribution table: one row per schedule date.
    pub fn contributions(&self) -> Vec<ContributionPoint> {
        self.schedule
            .iter()
            .enumerate()
            .map(|(i, &date)| ContributionPoint {
                date,
                amount: self.monthly_amount,
                cumulative: self.monthly_amount * (i + 1) as f64,
            })
            .collect()
    }

    /// Maximum accumulated contribution: the headline savings figure.
    pub fn max_accumulated(&self) -> f64 {
        self.monthly_amount * self.schedule.len() as f64
    }
}

/// Units accumulated by the plan on one trading day of an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitsPoint {
    pub date: NaiveDate,
    /// Units bought on this date, if any contribution settled here.
    pub units_bought: Option<f64>,
    /// Running total of units (`ahorro_dividido`).
    pub cumulative_units: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitsSeries {
    symbol: String,
    points: Vec<UnitsPoint>,
    bought: usize,
    skipped: usize,
}

impl UnitsSeries {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[UnitsPoint] {
        &self.points
    }

    /// Contributions that bought units.
    pub fn contributions_bought(&self) -> usize {
        self.bought
    }

    /// Contributions skipped: no trading day at or after them, or an unusable close.
    pub fn contributions_skipped(&self) -> usize {
        self.skipped
    }

    pub fn total_units(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.cumulative_units)
    }
}

/// Accumulate `monthly_amount / close` over the plan for one asset.
pub fn accumulate_units(plan: &SavingsPlan, prices: &PriceSeries) -> UnitsSeries {
    let points_in = prices.points();
    let mut settled: Vec<usize> = vec![0; points_in.len()];
    let mut skipped = 0;

    for &date in plan.schedule() {
        match prices.first_index_on_or_after(date) {
            Some(i) => settled[i] += 1,
            None => skipped += 1,
        }
    }

    let mut bought = 0;
    let mut cumulative_units = 0.0;
    let points = points_in
        .iter()
        .zip(&settled)
        .map(|(p, &count)| {
            let units_bought = if count == 0 {
                None
            } else {
                match usable_price(p.close) {
                    Some(close) => {
                        bought += count;
                        Some(count as f64 * plan.monthly_amount() / close)
                    }
                    None => {
                        skipped += count;
                        None
                    }
                }
            };
            cumulative_units += units_bought.unwrap_or(0.0);
            UnitsPoint {
                date: p.date,
                units_bought,
                cumulative_units,
            }
        })
        .collect();

    UnitsSeries {
        symbol: prices.symbol().to_string(),
        points,
        bought,
        skipped,
    }
}

/// Outcome of the plan for one asset at the end of the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsOutcome {
    pub units: f64,
    /// Amount that actually bought units.
    pub invested: f64,
    /// Units valued at the last usable close.
    pub market_value: Option<f64>,
    pub gain_pct: Option<f64>,
    pub skipped_contributions: usize,
}

impl SavingsOutcome {
    pub fn evaluate(plan: &SavingsPlan, units: &UnitsSeries, prices: &PriceSeries) -> Self {
        let total_units = units.total_units();
        let invested = plan.monthly_amount() * units.contributions_bought() as f64;
        let market_value = prices.last_usable_close().map(|close| total_units * close);
        let gain_pct = market_value
            .filter(|_| invested > 0.0)
            .map(|value| (value / invested - 1.0) * 100.0);
        Self {
            units: total_units,
            invested,
            market_value,
            gain_pct,
            skipped_contributions: units.contributions_skipped(),
        }
    }
}
