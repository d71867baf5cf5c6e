//! # Market Simulator Analytics
//!
//! Derives performance statistics from a portfolio equity curve.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** no I/O and no knowledge of where the curve came from.
//! - **Stateless calculation:** `AnalyticsEngine` only carries the
//!   risk-free rate. It takes a `(date, value)` series and produces a
//!   `MetricsSummary`, so identical inputs always give identical outputs.
//! - **No NaN in outputs:** metrics that are undefined for the given curve
//!   (too short a span, zero volatility) are `None`.
//!
//! ## Conventions
//!
//! - All arithmetic is `f64`, unlike the `Decimal` money handling elsewhere:
//!   annualization needs fractional powers and square roots, and the outputs
//!   are statistics rather than account balances.
//! - Daily returns are simple returns `V[i]/V[i-1] - 1`.
//! - Volatility uses the sample standard deviation of daily returns,
//!   annualized with `sqrt(252)`.
//! - Annualized return compounds over calendar years of 365.25 days.

pub mod engine;
pub mod error;
pub mod report;

pub use engine::{
    AnalyticsEngine, DAYS_PER_YEAR, MIN_ANNUALIZATION_DAYS, MIN_VOLATILITY, TRADING_DAYS_PER_YEAR,
};
pub use error::AnalyticsError;
pub use report::{MetricsSummary, MonthlyReturn};
