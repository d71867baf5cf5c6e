//! # Market Simulator Price Store
//!
//! Reads already-downloaded daily closing prices from disk. It is the
//! upstream collaborator of the backtest engine: it only turns files into
//! validated `PriceSeries` values and knows nothing about portfolios.
//!
//! ## Layout
//!
//! One CSV file per ticker, `<directory>/<TICKER>.csv`, with a header row
//! containing `date` and `close` columns (`Date`/`Close` are accepted too,
//! other columns are ignored). Rows with an empty close are provider gaps
//! and are skipped.
//!
//! ## Public API
//!
//! - `CsvPriceStore`: resolves tickers to files and loads date ranges.
//! - `StoreError`: the specific error types that can be returned from this crate.

pub mod error;
pub mod repository;

pub use error::StoreError;
pub use repository::CsvPriceStore;
