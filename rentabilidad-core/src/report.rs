//! End-to-end analysis: resolve, fetch, compute and align every requested symbol.
//!
//! Each symbol runs its own pipeline on the rayon pool. A failing symbol is
//! recorded in [`AnalysisReport::failures`] and never aborts the others. Only
//! request preconditions are returned as `Err`.

use crate::analytics::{
    accumulate_units, align_assets, compute_returns, normalize, resample_monthly, AlignInput,
    ConsolidatedTable, ResampledSeries, ReturnSeries, SavingsOutcome, SavingsPlan, UnitsSeries,
};
use crate::config::AnalysisRequest;
use crate::data::{MarketDataProvider, SymbolDirectory};
use crate::domain::PriceSeries;
use crate::error::AnalyticsError;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// Everything computed for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetReport {
    pub symbol: String,
    /// Display name when the directory knows the ticker.
    pub company: Option<String>,
    pub prices: PriceSeries,
    pub returns: ReturnSeries,
    pub monthly: ResampledSeries,
    pub units: UnitsSeries,
    pub savings: SavingsOutcome,
}

impl AssetReport {
    fn align_input(&self) -> AlignInput<'_> {
        AlignInput {
            prices: &self.prices,
            returns: &self.returns,
            units: &self.units,
        }
    }

    /// Total return over the window, from the monthly view.
    pub fn window_return_pct(&self) -> Option<f64> {
        self.monthly.total_return_pct()
    }

    /// Points with at least one missing OHLC field.
    pub fn partial_points(&self) -> usize {
        self.prices.points().iter().filter(|p| p.is_partial()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub request: AnalysisRequest,
    pub provider: String,
    pub plan: SavingsPlan,
    /// Successful symbols keyed by ticker.
    pub assets: BTreeMap<String, AssetReport>,
    pub table: ConsolidatedTable,
    /// Failed symbols keyed by ticker, or by the requested name when it never resolved.
    pub failures: BTreeMap<String, AnalyticsError>,
    pub data_quality_warnings: Vec<String>,
    /// BLAKE3 over the normalized prices of every successful symbol.
    pub dataset_hash: String,
}

impl AnalysisReport {
    /// `ahorros_max_acumulados`: the most the plan ever accumulated.
    pub fn headline_savings(&self) -> f64 {
        self.plan.max_accumulated()
    }

    pub fn asset(&self, symbol: &str) -> Option<&AssetReport> {
        self.assets.get(symbol)
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run the full analysis for `request`.
pub fn analyze(
    request: &AnalysisRequest,
    directory: &SymbolDirectory,
    provider: &dyn MarketDataProvider,
) -> Result<AnalysisReport, AnalyticsError> {
    request.validate()?;
    let plan = SavingsPlan::monthly(request.monthly_amount, request.start, request.end)?;

    let mut failures = BTreeMap::new();
    let mut seen = HashSet::new();
    let mut tickers: Vec<String> = Vec::new();
    for query in request.unique_symbols() {
        match directory.resolve(query) {
            Ok(ticker) => {
                if seen.insert(ticker.to_string()) {
                    tickers.push(ticker.to_string());
                } else {
                    debug!(query, ticker, "duplicate symbol after resolution");
                }
            }
            Err(err) => {
                warn!(query, error = %err, "symbol not resolved");
                failures.insert(query.to_string(), err);
            }
        }
    }

    info!(
        symbols = tickers.len(),
        provider = provider.name(),
        start = %request.start,
        end = %request.end,
        "starting analysis"
    );

    let results: BTreeMap<String, Result<AssetReport, AnalyticsError>> = tickers
        .par_iter()
        .map(|ticker| {
            let result = analyze_symbol(ticker, request, &plan, directory, provider);
            (ticker.clone(), result)
        })
        .collect();

    let alignment = align_assets(
        results
            .iter()
            .map(|(symbol, result)| {
                let input = result.as_ref().map(AssetReport::align_input).map_err(Clone::clone);
                (symbol.clone(), input)
            })
            .collect(),
        (request.start, request.end),
    );
    failures.extend(alignment.failures);

    let assets: BTreeMap<String, AssetReport> = results
        .into_iter()
        .filter_map(|(symbol, result)| result.ok().map(|asset| (symbol, asset)))
        .filter(|(symbol, _)| alignment.table.contains(symbol))
        .collect();

    let data_quality_warnings = quality_warnings(&assets);
    for warning in &data_quality_warnings {
        warn!("{warning}");
    }

    let report = AnalysisReport {
        request: request.clone(),
        provider: provider.name().to_string(),
        plan,
        dataset_hash: compute_dataset_hash(&assets),
        assets,
        table: alignment.table,
        failures,
        data_quality_warnings,
    };

    info!(
        succeeded = report.assets.len(),
        failed = report.failures.len(),
        dates = report.table.dates().len(),
        headline_savings = report.headline_savings(),
        "analysis complete"
    );
    Ok(report)
}

fn analyze_symbol(
    symbol: &str,
    request: &AnalysisRequest,
    plan: &SavingsPlan,
    directory: &SymbolDirectory,
    provider: &dyn MarketDataProvider,
) -> Result<AssetReport, AnalyticsError> {
    let raw = provider
        .fetch(symbol, request.start, request.end)
        .map_err(|e| e.into_analytics(symbol, request.start, request.end))?;
    // An empty series is turned into `EmptyHistory` by the aligner.
    let prices = normalize(symbol, &raw, request.start, request.end)?;

    let returns = compute_returns(&prices);
    let monthly = resample_monthly(&prices, &returns);
    let units = accumulate_units(plan, &prices);
    let savings = SavingsOutcome::evaluate(plan, &units, &prices);
    debug!(
        symbol,
        points = prices.len(),
        months = monthly.len(),
        units = savings.units,
        "symbol analyzed"
    );

    Ok(AssetReport {
        symbol: symbol.to_string(),
        company: directory.company_for(symbol).map(str::to_string),
        prices,
        returns,
        monthly,
        units,
        savings,
    })
}

fn quality_warnings(assets: &BTreeMap<String, AssetReport>) -> Vec<String> {
    let mut warnings = Vec::new();
    for (symbol, asset) in assets {
        // A daily anchor issue already explains the undefined monthly curve.
        if let Some(issue) = asset
            .returns
            .quality_issue()
            .or_else(|| asset.monthly.quality_issue())
        {
            warnings.push(issue.to_string());
        }
        let partial = asset.partial_points();
        if partial > 0 {
            warnings.push(format!("{symbol}: {partial} bars with missing price fields"));
        }
        if asset.savings.skipped_contributions > 0 {
            warnings.push(format!(
                "{symbol}: {} contributions skipped (no usable close)",
                asset.savings.skipped_contributions
            ));
        }
    }
    warnings
}

/// Deterministic BLAKE3 hash over dates and OHLCV + dividend values in ticker order.
fn compute_dataset_hash(assets: &BTreeMap<String, AssetReport>) -> String {
    let mut hasher = blake3::Hasher::new();
    for (symbol, asset) in assets {
        hasher.update(symbol.as_bytes());
        for point in asset.prices.points() {
            hasher.update(point.date.to_string().as_bytes());
            hasher.update(&point.open.to_le_bytes());
            hasher.update(&point.high.to_le_bytes());
            hasher.update(&point.low.to_le_bytes());
            hasher.update(&point.close.to_le_bytes());
            hasher.update(&point.volume.to_le_bytes());
            hasher.update(&point.dividend.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}
