//! # Market Simulator Core Types
//!
//! Plain data shared by every crate in the workspace: raw per-ticker price
//! histories, the date-aligned price table the engine consumes, and the
//! weighting scheme of a portfolio.
//!
//! These types hold no behaviour beyond construction-time validation and
//! read access. All numerical work lives in `analytics` and
//! `portfolio-backtester`.

pub mod error;
pub mod series;
pub mod table;
pub mod weights;

// Re-export the core types to provide a clean public API.
pub use error::CoreError;
pub use series::{PricePoint, PriceSeries};
pub use table::PriceTable;
pub use weights::WeightVector;
