//! # Market Simulator Portfolio Backtester
//!
//! Turns per-ticker closing-price histories and a weighting scheme into a
//! buy-and-hold equity curve and its performance metrics.
//!
//! The pipeline has two stages:
//!
//! 1. [`normalize`] inner-joins the series on their trading dates and builds
//!    a `PriceTable` in which every date has a price for every ticker.
//! 2. [`PortfolioBacktester`] buys fractional shares on the first date
//!    according to the weights, holds them, values the portfolio on every
//!    date and hands the curve to `analytics`.
//!
//! Both stages are pure and synchronous. [`load_price_series`] and
//! [`PortfolioBacktester::run_with_benchmark`] are async conveniences for
//! callers that load data from a `CsvPriceStore` or run a benchmark next to
//! the portfolio.

pub mod data_handler;
pub mod error;
pub mod manager;

pub use data_handler::{load_price_series, normalize};
pub use error::PortfolioError;
pub use manager::{
    BacktestParams, BacktestResult, BenchmarkComparison, PortfolioBacktester, WEIGHT_SUM_TOLERANCE,
    run_backtest,
};
