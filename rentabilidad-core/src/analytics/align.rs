//! Multi-asset alignment onto a shared date axis.
//!
//! The table's index is the union of every included symbol's trading dates.
//! Columns are sparse: a symbol only holds values on dates it was observed, so
//! a missing observation stays missing (no cross-asset forward-fill). Symbols
//! that failed upstream, or arrive with no observations, are reported and left
//! out without affecting the others.

use super::returns::ReturnSeries;
use super::savings::UnitsSeries;
use crate::domain::PriceSeries;
use crate::error::AnalyticsError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// The three per-asset columns of the consolidated table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Cumulative return in percent.
    Cambios,
    /// Daily high.
    ValorMax,
    /// Cumulative units bought by the savings plan.
    AhorroDividido,
}

impl ColumnKind {
    pub const ALL: [ColumnKind; 3] = [Self::Cambios, Self::ValorMax, Self::AhorroDividido];

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Cambios => "cambios",
            Self::ValorMax => "valor_max",
            Self::AhorroDividido => "ahorro_dividido",
        }
    }

    /// Column label, e.g. `AAPL_cambios`.
    pub fn label(self, symbol: &str) -> String {
        format!("{symbol}_{}", self.suffix())
    }
}

/// Sparse columns for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetColumns {
    pub cambios: BTreeMap<NaiveDate, f64>,
    pub valor_max: BTreeMap<NaiveDate, f64>,
    pub ahorro_dividido: BTreeMap<NaiveDate, f64>,
}

impl AssetColumns {
    pub fn column(&self, kind: ColumnKind) -> &BTreeMap<NaiveDate, f64> {
        match kind {
            ColumnKind::Cambios => &self.cambios,
            ColumnKind::ValorMax => &self.valor_max,
            ColumnKind::AhorroDividido => &self.ahorro_dividido,
        }
    }

    /// Every date with at least one value.
    pub fn observed_dates(&self) -> BTreeSet<NaiveDate> {
        ColumnKind::ALL
            .iter()
            .flat_map(|k| self.column(*k).keys().copied())
            .collect()
    }
}

/// Per-symbol inputs to the aligner.
#[derive(Debug, Clone, Copy)]
pub struct AlignInput<'a> {
    pub prices: &'a PriceSeries,
    pub returns: &'a ReturnSeries,
    pub units: &'a UnitsSeries,
}

impl AlignInput<'_> {
    fn to_columns(self) -> AssetColumns {
        let cambios = self
            .returns
            .points()
            .iter()
            .filter_map(|p| p.cumulative_return_pct.map(|r| (p.date, r)))
            .collect();
        let valor_max = self
            .prices
            .points()
            .iter()
            .filter(|p| p.high.is_finite())
            .map(|p| (p.date, p.high))
            .collect();
        let ahorro_dividido = self
            .units
            .points()
            .iter()
            .map(|p| (p.date, p.cumulative_units))
            .collect();
        AssetColumns {
            cambios,
            valor_max,
            ahorro_dividido,
        }
    }
}

/// Wide, multi-asset table keyed by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedTable {
    dates: Vec<NaiveDate>,
    assets: BTreeMap<String, AssetColumns>,
}

/// One row of the wide view, values ordered like [`ConsolidatedTable::column_labels`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub date: NaiveDate,
    pub values: Vec<Option<f64>>,
}

impl ConsolidatedTable {
    /// Union of all included symbols' dates, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.assets.keys().map(String::as_str)
    }

    pub fn asset(&self, symbol: &str) -> Option<&AssetColumns> {
        self.assets.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.assets.contains_key(symbol)
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn value(&self, symbol: &str, kind: ColumnKind, date: NaiveDate) -> Option<f64> {
        self.assets
            .get(symbol)
            .and_then(|a| a.column(kind).get(&date).copied())
    }

    /// Column labels in symbol order, three per symbol.
    pub fn column_labels(&self) -> Vec<String> {
        self.assets
            .keys()
            .flat_map(|s| ColumnKind::ALL.iter().map(move |k| k.label(s)))
            .collect()
    }

    /// Dense rows over the shared date axis; absent cells are `None`.
    pub fn rows(&self) -> Vec<TableRow> {
        self.dates
            .iter()
            .map(|&date| TableRow {
                date,
                values: self
                    .assets
                    .values()
                    .flat_map(|a| ColumnKind::ALL.iter().map(move |k| a.column(*k).get(&date).copied()))
                    .collect(),
            })
            .collect()
    }
}

/// Table plus the symbols left out of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Alignment {
    pub table: ConsolidatedTable,
    pub failures: BTreeMap<String, AnalyticsError>,
}

/// Outer-join every successful symbol onto the shared date axis.
///
/// Failed inputs are passed through to `failures`. A successful input with no
/// observations becomes an [`AnalyticsError::EmptyHistory`] failure dated by
/// `window`.
pub fn align_assets<'a>(
    inputs: BTreeMap<String, Result<AlignInput<'a>, AnalyticsError>>,
    window: (NaiveDate, NaiveDate),
) -> Alignment {
    let mut assets = BTreeMap::new();
    let mut failures = BTreeMap::new();

    for (symbol, input) in inputs {
        match input {
            Ok(input) if input.prices.is_empty() => {
                let err = AnalyticsError::EmptyHistory {
                    symbol: symbol.clone(),
                    start: window.0,
                    end: window.1,
                };
                warn!(%symbol, error = %err, "symbol omitted from consolidated table");
                failures.insert(symbol, err);
            }
            Ok(input) => {
                assets.insert(symbol, input.to_columns());
            }
            Err(err) => {
                warn!(%symbol, error = %err, "symbol omitted from consolidated table");
                failures.insert(symbol, err);
            }
        }
    }

    let dates: BTreeSet<NaiveDate> = assets
        .values()
        .flat_map(|a: &AssetColumns| a.observed_dates())
        .collect();

    Alignment {
        table: ConsolidatedTable {
            dates: dates.into_iter().collect(),
            assets,
        },
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::returns::compute_returns;
    use crate::analytics::savings::{accumulate_units, SavingsPlan};
    use crate::domain::DailyPoint;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn series(symbol: &str, rows: &[(&str, f64)]) -> PriceSeries {
        let points = rows
            .iter()
            .map(|&(date, close)| DailyPoint {
                date: d(date),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1,
                dividend: 0.0,
            })
            .collect();
        PriceSeries::new(symbol, points).unwrap()
    }

    struct Derived {
        prices: PriceSeries,
        returns: ReturnSeries,
        units: UnitsSeries,
    }

    fn derive(prices: PriceSeries, plan: &SavingsPlan) -> Derived {
        let returns = compute_returns(&prices);
        let units = accumulate_units(plan, &prices);
        Derived {
            prices,
            returns,
            units,
        }
    }

    fn input(d: &Derived) -> AlignInput<'_> {
        AlignInput {
            prices: &d.prices,
            returns: &d.returns,
            units: &d.units,
        }
    }

    fn window() -> (NaiveDate, NaiveDate) {
        (d("2024-01-01"), d("2024-01-31"))
    }

    #[test]
    fn outer_join_without_cross_asset_fill() {
        let plan = SavingsPlan::monthly(100.0, d("2024-01-02"), d("2024-01-31")).unwrap();
        let a = derive(
            series("A", &[("2024-01-02", 100.0), ("2024-01-03", 110.0), ("2024-01-04", 121.0)]),
            &plan,
        );
        let b = derive(series("B", &[("2024-01-02", 50.0), ("2024-01-04", 55.0)]), &plan);

        let mut inputs = BTreeMap::new();
        inputs.insert("A".to_string(), Ok(input(&a)));
        inputs.insert("B".to_string(), Ok(input(&b)));
        let alignment = align_assets(inputs, window());
        let table = &alignment.table;

        assert_eq!(table.dates(), &[d("2024-01-02"), d("2024-01-03"), d("2024-01-04")]);
        assert!(alignment.failures.is_empty());
        for kind in ColumnKind::ALL {
            assert_eq!(table.value("B", kind, d("2024-01-03")), None);
        }
        assert!((table.value("A", ColumnKind::Cambios, d("2024-01-03")).unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(table.value("B", ColumnKind::ValorMax, d("2024-01-04")), Some(56.0));
        assert_eq!(table.value("A", ColumnKind::AhorroDividido, d("2024-01-04")), Some(1.0));
    }

    #[test]
    fn failed_and_empty_symbols_are_reported_and_omitted() {
        let plan = SavingsPlan::monthly(100.0, d("2024-01-02"), d("2024-01-31")).unwrap();
        let a = derive(series("A", &[("2024-01-02", 100.0)]), &plan);
        let empty = derive(PriceSeries::empty("B"), &plan);

        let mut inputs = BTreeMap::new();
        inputs.insert("A".to_string(), Ok(input(&a)));
        inputs.insert("B".to_string(), Ok(input(&empty)));
        inputs.insert(
            "C".to_string(),
            Err(AnalyticsError::SymbolNotFound { symbol: "C".into() }),
        );
        let alignment = align_assets(inputs, window());

        assert!(alignment.table.contains("A"));
        assert!(!alignment.table.contains("B"));
        assert!(!alignment.table.contains("C"));
        assert!(matches!(
            alignment.failures["B"],
            AnalyticsError::EmptyHistory { .. }
        ));
        assert!(matches!(
            alignment.failures["C"],
            AnalyticsError::SymbolNotFound { .. }
        ));
        assert_eq!(alignment.table.column_labels(), vec!["A_cambios", "A_valor_max", "A_ahorro_dividido"]);
    }

    #[test]
    fn undefined_returns_leave_cambios_empty_but_keep_other_columns() {
        let plan = SavingsPlan::monthly(100.0, d("2024-01-02"), d("2024-01-31")).unwrap();
        let a = derive(series("A", &[("2024-01-02", 0.0), ("2024-01-03", 10.0)]), &plan);
        let mut inputs = BTreeMap::new();
        inputs.insert("A".to_string(), Ok(input(&a)));
        let table = align_assets(inputs, window()).table;

        assert!(table.asset("A").unwrap().cambios.is_empty());
        assert_eq!(table.value("A", ColumnKind::ValorMax, d("2024-01-03")), Some(11.0));
        // First contribution landed on a zero close and was skipped.
        assert_eq!(table.value("A", ColumnKind::AhorroDividido, d("2024-01-03")), Some(0.0));
    }

    #[test]
    fn rows_follow_label_order() {
        let plan = SavingsPlan::monthly(0.0, d("2024-01-02"), d("2024-01-31")).unwrap();
        let a = derive(series("A", &[("2024-01-02", 1.0)]), &plan);
        let b = derive(series("B", &[("2024-01-03", 2.0)]), &plan);
        let mut inputs = BTreeMap::new();
        inputs.insert("B".to_string(), Ok(input(&b)));
        inputs.insert("A".to_string(), Ok(input(&a)));
        let table = align_assets(inputs, window()).table;

        let rows = table.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values.len(), 6);
        assert_eq!(rows[0].values[1], Some(2.0));
        assert_eq!(rows[0].values[3..], [None::<f64>, None, None]);
        assert_eq!(rows[1].values[..3], [None::<f64>, None, None]);
    }
}
