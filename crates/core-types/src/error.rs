use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Duplicate observation for date {0}")]
    DuplicateDate(NaiveDate),

    #[error("Price on {date} must be a positive finite number, got {price}")]
    InvalidPrice { date: NaiveDate, price: f64 },
}
