use crate::error::PortfolioError;
use chrono::NaiveDate;
use core_types::{PriceSeries, PriceTable};
use futures::future::join_all;
use price_store::CsvPriceStore;
use std::collections::BTreeMap;

/// Loads the closing prices of every ticker from the store, concurrently.
pub async fn load_price_series(
    store: &CsvPriceStore,
    tickers: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<BTreeMap<String, PriceSeries>, PortfolioError> {
    let fetch_futures = tickers
        .iter()
        .map(|ticker| store.get_closes_by_date_range(ticker, start, end));

    let results = join_all(fetch_futures).await;

    let mut series = BTreeMap::new();
    for (ticker, result) in tickers.iter().zip(results) {
        series.insert(ticker.clone(), result?);
    }
    Ok(series)
}

/// Aligns several price series on the trading dates they all share.
///
/// This is an inner join: a date survives only if every ticker has a close
/// on it. The resulting table is sorted chronologically.
///
/// Fails with `InsufficientData` when no series is supplied, when any series
/// has fewer than two observations, or when the series have no date in
/// common. A ticker that does not overlap the others fails the whole
/// normalization rather than being dropped from the portfolio.
pub fn normalize(series: &BTreeMap<String, PriceSeries>) -> Result<PriceTable, PortfolioError> {
    if series.is_empty() {
        return Err(PortfolioError::InsufficientData(
            "no price series supplied".to_string(),
        ));
    }

    if let Some((ticker, s)) = series.iter().find(|(_, s)| s.len() < 2) {
        return Err(PortfolioError::InsufficientData(format!(
            "{ticker} has {} observation(s), at least 2 are required",
            s.len()
        )));
    }

    let mut by_date: BTreeMap<NaiveDate, BTreeMap<String, f64>> = BTreeMap::new();
    for (ticker, s) in series {
        for point in s.points() {
            by_date
                .entry(point.date)
                .or_default()
                .insert(ticker.clone(), point.close);
        }
    }

    let observed = by_date.len();
    let rows: Vec<_> = by_date
        .into_iter()
        .filter(|(_, row)| row.len() == series.len())
        .collect();

    if rows.is_empty() {
        let tickers: Vec<&str> = series.keys().map(String::as_str).collect();
        return Err(PortfolioError::InsufficientData(format!(
            "no trading date is common to all of {}",
            tickers.join(", ")
        )));
    }

    tracing::debug!(
        tickers = series.len(),
        observed_dates = observed,
        common_dates = rows.len(),
        "Normalized price series."
    );

    Ok(PriceTable::new(series.keys().cloned().collect(), rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn series(points: &[(u32, f64)]) -> PriceSeries {
        PriceSeries::from_pairs(points.iter().map(|(day, p)| (d(*day), *p))).unwrap()
    }

    #[test]
    fn keeps_only_common_dates() {
        let input = BTreeMap::from([
            ("AAPL".to_string(), series(&[(1, 10.0), (2, 11.0), (3, 12.0), (6, 13.0)])),
            ("MSFT".to_string(), series(&[(2, 20.0), (3, 21.0), (6, 22.0), (7, 23.0)])),
        ]);

        let table = normalize(&input).unwrap();
        assert_eq!(table.dates(), &[d(2), d(3), d(6)]);
        assert_eq!(table.price("AAPL", 0), Some(11.0));
        assert_eq!(table.price("MSFT", 2), Some(22.0));
    }

    #[test]
    fn single_ticker_passes_through() {
        let input = BTreeMap::from([("SPY".to_string(), series(&[(1, 1.0), (2, 2.0)]))]);
        let table = normalize(&input).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.tickers(), &["SPY".to_string()]);
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(
            normalize(&BTreeMap::new()),
            Err(PortfolioError::InsufficientData(_))
        ));
    }

    #[test]
    fn rejects_series_with_a_single_observation() {
        let input = BTreeMap::from([
            ("AAPL".to_string(), series(&[(1, 10.0), (2, 11.0)])),
            ("OPEN".to_string(), series(&[(1, 5.0)])),
        ]);
        let err = normalize(&input).unwrap_err();
        assert!(matches!(err, PortfolioError::InsufficientData(msg) if msg.contains("OPEN")));
    }

    #[test]
    fn rejects_disjoint_histories() {
        let input = BTreeMap::from([
            ("AAPL".to_string(), series(&[(1, 10.0), (2, 11.0)])),
            ("TSLA".to_string(), series(&[(8, 5.0), (9, 6.0)])),
        ]);
        assert!(matches!(
            normalize(&input),
            Err(PortfolioError::InsufficientData(_))
        ));
    }
}
