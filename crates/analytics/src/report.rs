use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Summary statistics of one equity curve.
///
/// Fractions are plain ratios (0.25 means 25%). Fields that can be undefined
/// for a given curve are `Option`s and serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Calendar years between the first and last date.
    pub years: f64,

    // I. Returns
    pub total_return: f64,
    pub annualized_return: Option<f64>, // None when the span is too short to annualize

    // II. Risk
    pub annualized_volatility: Option<f64>,
    pub sharpe_ratio: Option<f64>, // None for zero or undefined volatility
    pub max_drawdown: f64,
}

/// Compounded return of one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReturn {
    pub year: i32,
    pub month: u32,
    pub value: f64,
}
