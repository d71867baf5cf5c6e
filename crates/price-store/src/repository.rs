use crate::StoreError;
use chrono::NaiveDate;
use core_types::{PricePoint, PriceSeries};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One row of a price file.
#[derive(Debug, Deserialize)]
struct CloseRow {
    #[serde(alias = "Date")]
    date: NaiveDate,
    #[serde(alias = "Close")]
    close: Option<f64>,
}

/// The `CsvPriceStore` provides access to per-ticker daily closes kept as
/// CSV files in a single directory.
#[derive(Debug, Clone)]
pub struct CsvPriceStore {
    root: PathBuf,
}

impl CsvPriceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file a ticker's history is read from.
    pub fn path_for(&self, ticker: &str) -> Result<PathBuf, StoreError> {
        let valid = !ticker.is_empty()
            && ticker
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
            && !ticker.starts_with('.');
        if !valid {
            return Err(StoreError::InvalidTicker(ticker.to_string()));
        }
        Ok(self.root.join(format!("{ticker}.csv")))
    }

    /// Loads the closes of `ticker` with `start <= date <= end`.
    pub async fn get_closes_by_date_range(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, StoreError> {
        let path = self.path_for(ticker)?;
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    ticker: ticker.to_string(),
                    path: path.display().to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let series = parse_closes(ticker, &contents, start, end)?;
        tracing::debug!(
            ticker,
            observations = series.len(),
            %start,
            %end,
            "Loaded closing prices."
        );
        Ok(series)
    }
}

fn parse_closes(
    ticker: &str,
    contents: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PriceSeries, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(contents.as_bytes());

    let mut points = Vec::new();
    let mut gaps = 0usize;

    for result in reader.deserialize::<CloseRow>() {
        let row = result.map_err(|source| StoreError::Csv {
            ticker: ticker.to_string(),
            source,
        })?;

        if row.date < start || row.date > end {
            continue;
        }

        match row.close {
            Some(close) => points.push(PricePoint::new(row.date, close)),
            None => gaps += 1,
        }
    }

    if gaps > 0 {
        tracing::warn!(ticker, gaps, "Skipped rows without a closing price.");
    }

    PriceSeries::new(points).map_err(|source| StoreError::Core {
        ticker: ticker.to_string(),
        source,
    })
}
