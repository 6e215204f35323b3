//! Rentabilidad CLI: return, dividend and savings analysis for listed companies.
//!
//! Commands:
//! - `analyze`: run the analysis from flags or a TOML config file
//! - `symbols`: list the company directory

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rentabilidad_core::analytics::ColumnKind;
use rentabilidad_core::data::{
    CsvProvider, MarketDataProvider, RetryingProvider, SymbolDirectory, SyntheticProvider,
    YahooProvider,
};
use rentabilidad_core::{analyze, AnalysisConfig, AnalysisReport, AnalysisRequest};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "rentabilidad",
    about = "Historical returns, dividends and monthly-savings analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one or more companies over a date range.
    Analyze {
        /// Path to a TOML config file. Flags override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Company names or tickers (e.g., AAPL "Microsoft").
        #[arg(long, num_args = 1..)]
        symbols: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to one year before the end date.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Amount saved at the start of every month.
        #[arg(long)]
        monthly: Option<f64>,

        /// Company directory CSV. Defaults to the built-in sample.
        #[arg(long)]
        directory: Option<PathBuf>,

        /// Read `<SYMBOL>.csv` files from this directory instead of Yahoo Finance.
        #[arg(long, conflicts_with = "synthetic")]
        history_dir: Option<PathBuf>,

        /// Use deterministic synthetic data (no network access).
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Print the full report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List the company directory.
    Symbols {
        /// Company directory CSV. Defaults to the built-in sample.
        #[arg(long)]
        directory: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            config,
            symbols,
            start,
            end,
            monthly,
            directory,
            history_dir,
            synthetic,
            json,
        } => run_analyze(AnalyzeArgs {
            config,
            symbols,
            start,
            end,
            monthly,
            directory,
            history_dir,
            synthetic,
            json,
        }),
        Commands::Symbols { directory } => run_symbols(directory.as_deref()),
    }
}

struct AnalyzeArgs {
    config: Option<PathBuf>,
    symbols: Vec<String>,
    start: Option<String>,
    end: Option<String>,
    monthly: Option<f64>,
    directory: Option<PathBuf>,
    history_dir: Option<PathBuf>,
    synthetic: bool,
    json: bool,
}

fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let config = args
        .config
        .as_deref()
        .map(AnalysisConfig::from_file)
        .transpose()?;

    let end = match parse_date(args.end.as_deref())? {
        Some(date) => date,
        None => config
            .as_ref()
            .map(|c| c.analysis.end_date)
            .unwrap_or_else(|| chrono::Local::now().date_naive()),
    };
    let start = match parse_date(args.start.as_deref())? {
        Some(date) => date,
        None => config
            .as_ref()
            .map(|c| c.analysis.start_date)
            .unwrap_or_else(|| end - chrono::Duration::days(365)),
    };
    let symbols = if args.symbols.is_empty() {
        config
            .as_ref()
            .map(|c| c.analysis.symbols.clone())
            .unwrap_or_default()
    } else {
        args.symbols
    };
    if symbols.is_empty() {
        bail!("no symbols given: pass --symbols or a config with [analysis] symbols");
    }
    let monthly_amount = args
        .monthly
        .or_else(|| config.as_ref().map(|c| c.analysis.monthly_amount))
        .unwrap_or(0.0);

    let directory_path = args.directory.or_else(|| {
        config
            .as_ref()
            .and_then(|c| c.directory.as_ref())
            .map(|d| d.path.clone())
    });
    let directory = load_directory(directory_path.as_deref())?;

    let provider_cfg = config.map(|c| c.provider).unwrap_or_default();
    let provider: Box<dyn MarketDataProvider> = if args.synthetic {
        Box::new(SyntheticProvider::default())
    } else if let Some(dir) = args.history_dir {
        Box::new(CsvProvider::new(dir))
    } else {
        let yahoo = YahooProvider::new(provider_cfg.timeout())?;
        Box::new(RetryingProvider::new(yahoo, provider_cfg.retry_policy()))
    };

    let request = AnalysisRequest::new(symbols, start, end, monthly_amount);
    let report = analyze(&request, &directory, provider.as_ref())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    if report.assets.is_empty() {
        bail!("no symbol could be analyzed");
    }
    Ok(())
}

fn run_symbols(directory: Option<&Path>) -> Result<()> {
    let directory = load_directory(directory)?;
    println!("{:<8} {:<40} {:<24}", "Symbol", "Security", "Sector");
    println!("{}", "-".repeat(74));
    for listing in directory.listings() {
        println!(
            "{:<8} {:<40} {:<24}",
            listing.symbol, listing.security, listing.sector
        );
    }
    println!();
    println!("{} companies", directory.len());
    Ok(())
}

fn load_directory(path: Option<&Path>) -> Result<SymbolDirectory> {
    match path {
        Some(path) => SymbolDirectory::from_csv_path(path)
            .with_context(|| format!("loading company directory {}", path.display())),
        None => Ok(SymbolDirectory::sample_sp500()),
    }
}

fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
        })
        .transpose()
}

fn format_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}%"))
}

fn print_summary(report: &AnalysisReport) {
    println!();
    println!("=== Rentabilidad ===");
    println!(
        "Period:         {} to {}",
        report.request.start, report.request.end
    );
    println!("Provider:       {}", report.provider);
    println!(
        "Monthly saving: {:.2} x {} months",
        report.plan.monthly_amount(),
        report.plan.schedule().len()
    );
    println!("Max saved:      {:.2}", report.headline_savings());
    println!();
    println!(
        "{:<8} {:>6} {:>12} {:>10} {:>12} {:>12} {:>10}",
        "Symbol", "Days", "Return", "Dividends", "Units", "Value", "Gain"
    );
    println!("{}", "-".repeat(76));
    for (symbol, asset) in &report.assets {
        println!(
            "{:<8} {:>6} {:>12} {:>10.2} {:>12.4} {:>12} {:>10}",
            symbol,
            asset.prices.len(),
            format_pct(asset.window_return_pct()),
            asset.returns.total_dividends(),
            asset.savings.units,
            asset
                .savings
                .market_value
                .map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}")),
            format_pct(asset.savings.gain_pct),
        );
    }

    if let Some(&last) = report.table.dates().last() {
        println!();
        println!("--- Latest row ({last}) ---");
        for symbol in report.table.symbols() {
            let cells: Vec<String> = ColumnKind::ALL
                .iter()
                .map(|kind| {
                    let value = report
                        .table
                        .value(symbol, *kind, last)
                        .map_or_else(|| "-".to_string(), |v| format!("{v:.4}"));
                    format!("{}={value}", kind.label(symbol))
                })
                .collect();
            println!("{}", cells.join("  "));
        }
    }

    for (symbol, err) in &report.failures {
        println!("ERROR: {symbol}: {err}");
    }
    for warn in &report.data_quality_warnings {
        println!("WARNING: {warn}");
    }
    println!();
    println!("Dataset hash:   {}", report.dataset_hash);
}
