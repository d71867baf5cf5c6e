use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No price file found for ticker '{ticker}' at {path}")]
    NotFound { ticker: String, path: String },

    #[error("Invalid ticker symbol '{0}'")]
    InvalidTicker(String),

    #[error("Failed to read price file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed price file for '{ticker}': {source}")]
    Csv {
        ticker: String,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid price data for '{ticker}': {source}")]
    Core {
        ticker: String,
        #[source]
        source: core_types::CoreError,
    },
}
