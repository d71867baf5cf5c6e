use analytics::MetricsSummary;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL};
use configuration::{CliOverrides, load_config};
use core_types::WeightVector;
use portfolio_backtester::{
    BacktestParams, BacktestResult, BenchmarkComparison, PortfolioBacktester, load_price_series,
    normalize,
};
use price_store::CsvPriceStore;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// The main entry point for the market simulator.
#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Parse command-line arguments
    let cli = Cli::parse();

    // Execute the appropriate command
    match cli.command {
        Commands::Backtest(args) => handle_backtest(args).await?,
    }

    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Backtests a static-weight, buy-and-hold portfolio over historical closes.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a backtest described by a configuration file.
    Backtest(BacktestArgs),
}

#[derive(Parser)]
struct BacktestArgs {
    /// Path to the TOML configuration file.
    #[arg(long, short, default_value = "config.toml")]
    config: PathBuf,

    /// Print the full result as JSON instead of tables.
    #[arg(long)]
    json: bool,

    /// Also print compounded returns per calendar month.
    #[arg(long)]
    monthly: bool,

    #[command(flatten)]
    overrides: CliOverrides,
}

// ==============================================================================
// Backtest Command Logic
// ==============================================================================

/// Handles the orchestration of a backtest run.
async fn handle_backtest(args: BacktestArgs) -> Result<()> {
    let mut config = load_config(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    config.apply_overrides(&args.overrides)?;

    let bt = &config.backtest;
    let params = BacktestParams::new(bt.initial_investment_f64()?)
        .with_risk_free_rate(bt.risk_free_rate_f64()?);
    let weights = bt.weights_f64()?.map(WeightVector::custom);

    tracing::info!(
        tickers = ?bt.tickers,
        start = %bt.start_date,
        end = %bt.end_date,
        benchmark = ?bt.benchmark,
        "Starting backtest."
    );

    let store = CsvPriceStore::new(&config.data.directory);
    let series = load_price_series(&store, &bt.tickers, bt.start_date, bt.end_date)
        .await
        .context("Failed to load portfolio prices")?;

    let backtester = PortfolioBacktester::new(params);

    match &bt.benchmark {
        Some(ticker) => {
            let benchmark_series = store
                .get_closes_by_date_range(ticker, bt.start_date, bt.end_date)
                .await
                .with_context(|| format!("Failed to load benchmark prices for {ticker}"))?;
            let comparison = backtester
                .run_with_benchmark(series, weights, ticker.clone(), benchmark_series)
                .await?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&comparison)?);
            } else {
                print_comparison(&bt.tickers, &comparison);
                if args.monthly {
                    print_monthly(&comparison.portfolio);
                }
            }
        }
        None => {
            let table = normalize(&series)?;
            let result = backtester.run(&table, weights.as_ref())?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&bt.tickers, &result);
                if args.monthly {
                    print_monthly(&result);
                }
            }
        }
    }

    Ok(())
}

// ==============================================================================
// Presentation
// ==============================================================================

fn pct(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{:.2}%", v * 100.0))
}

fn ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.4}"))
}

fn period(start: NaiveDate, end: NaiveDate) -> String {
    format!("{start} → {end}")
}

fn metric_rows(result: &BacktestResult) -> Vec<String> {
    let m: &MetricsSummary = &result.metrics;
    vec![
        period(m.start_date, m.end_date),
        format!("${:.2}", result.initial_investment),
        format!("${:.2}", result.final_value()),
        pct(Some(m.total_return)),
        pct(m.annualized_return),
        pct(m.annualized_volatility),
        ratio(m.sharpe_ratio),
        pct(Some(m.max_drawdown)),
    ]
}

const METRIC_LABELS: [&str; 8] = [
    "Period",
    "Initial investment",
    "Final value",
    "Total return",
    "Annualized return",
    "Annualized volatility",
    "Sharpe ratio",
    "Max drawdown",
];

fn print_result(tickers: &[String], result: &BacktestResult) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Metric".to_string(), format!("Portfolio ({})", tickers.join(", "))]);

    for (label, value) in METRIC_LABELS.iter().zip(metric_rows(result)) {
        table.add_row(vec![label.to_string(), value]);
    }

    println!("{table}");
}

fn print_comparison(tickers: &[String], comparison: &BenchmarkComparison) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Metric".to_string(),
        format!("Portfolio ({})", tickers.join(", ")),
        format!("Benchmark ({})", comparison.benchmark_ticker),
    ]);

    let rows = metric_rows(&comparison.portfolio)
        .into_iter()
        .zip(metric_rows(&comparison.benchmark));
    for (label, (portfolio, benchmark)) in METRIC_LABELS.iter().zip(rows) {
        table.add_row(vec![label.to_string(), portfolio, benchmark]);
    }

    println!("{table}");
    println!(
        "Excess total return: {}   Excess annualized return: {}",
        pct(Some(comparison.excess_total_return)),
        pct(comparison.excess_annualized_return)
    );
}

fn print_monthly(result: &BacktestResult) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Month", "Return"]);

    for m in result.monthly_returns() {
        table.add_row(vec![format!("{}-{:02}", m.year, m.month), pct(Some(m.value))]);
    }

    println!("{table}");
}
