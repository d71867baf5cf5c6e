use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Not enough data to perform calculation: {0}")]
    NotEnoughData(String),

    #[error("Equity value on {date} must be positive and finite, got {value}")]
    InvalidEquity { date: NaiveDate, value: f64 },

    #[error("Equity curve dates are not strictly increasing at {0}")]
    UnorderedDates(NaiveDate),

    #[error("Risk-free rate must be finite, got {0}")]
    InvalidRiskFreeRate(f64),
}
