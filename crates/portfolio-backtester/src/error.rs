use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("Insufficient price data: {0}")]
    InsufficientData(String),

    #[error("Invalid weights: {0}")]
    InvalidWeight(String),

    #[error("Initial investment must be a positive finite amount, got {0}")]
    InvalidInvestment(f64),

    #[error("Analytics calculation error: {0}")]
    Analytics(#[from] analytics::AnalyticsError),

    #[error("Invalid price data: {0}")]
    Core(#[from] core_types::CoreError),

    #[error("Price store error: {0}")]
    Store(#[from] price_store::StoreError),

    #[error("Backtest task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for PortfolioError {
    fn from(error: tokio::task::JoinError) -> Self {
        PortfolioError::Task(error.to_string())
    }
}
