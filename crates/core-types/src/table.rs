use crate::error::CoreError;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Closing prices of several tickers aligned on a common set of dates.
///
/// Invariants enforced by [`PriceTable::new`]:
/// - dates are strictly ascending;
/// - every row holds a price for every ticker of the table, and nothing else;
/// - every price is positive and finite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceTable {
    tickers: Vec<String>,
    dates: Vec<NaiveDate>,
    rows: Vec<BTreeMap<String, f64>>,
}

impl PriceTable {
    pub fn new(
        mut tickers: Vec<String>,
        rows: Vec<(NaiveDate, BTreeMap<String, f64>)>,
    ) -> Result<Self, CoreError> {
        tickers.sort();
        tickers.dedup();
        if tickers.is_empty() {
            return Err(CoreError::InvalidInput(
                "price table".to_string(),
                "at least one ticker is required".to_string(),
            ));
        }

        let mut dates = Vec::with_capacity(rows.len());
        let mut prices = Vec::with_capacity(rows.len());

        for (date, row) in rows {
            if let Some(&prev) = dates.last() {
                if date <= prev {
                    return Err(CoreError::InvalidInput(
                        "price table".to_string(),
                        format!("date {date} does not follow {prev}"),
                    ));
                }
            }

            if row.len() != tickers.len() || !tickers.iter().all(|t| row.contains_key(t)) {
                return Err(CoreError::InvalidInput(
                    "price table".to_string(),
                    format!("row for {date} does not cover exactly the tickers {tickers:?}"),
                ));
            }

            if let Some((_, &price)) = row.iter().find(|(_, p)| !(p.is_finite() && **p > 0.0)) {
                return Err(CoreError::InvalidPrice { date, price });
            }

            dates.push(date);
            prices.push(row);
        }

        Ok(Self {
            tickers,
            dates,
            rows: prices,
        })
    }

    /// Ticker symbols in ascending order.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn has_ticker(&self, ticker: &str) -> bool {
        self.tickers.binary_search_by(|t| t.as_str().cmp(ticker)).is_ok()
    }

    /// The full price row of the `index`-th date.
    pub fn row(&self, index: usize) -> Option<&BTreeMap<String, f64>> {
        self.rows.get(index)
    }

    pub fn price(&self, ticker: &str, index: usize) -> Option<f64> {
        self.rows.get(index).and_then(|row| row.get(ticker).copied())
    }

    /// Iterates over `(date, row)` pairs in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &BTreeMap<String, f64>)> {
        self.dates.iter().copied().zip(self.rows.iter())
    }
}
