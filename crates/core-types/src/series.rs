use crate::error::CoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single daily closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// The daily closing-price history of one ticker.
///
/// Dates are strictly increasing and every close is a positive, finite
/// number. The series is immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series from observations in any order.
    ///
    /// The points are sorted chronologically. A repeated date or a price that
    /// is zero, negative, NaN or infinite is rejected.
    pub fn new(mut points: Vec<PricePoint>) -> Result<Self, CoreError> {
        points.sort_by_key(|p| p.date);

        for pair in points.windows(2) {
            if pair[0].date == pair[1].date {
                return Err(CoreError::DuplicateDate(pair[1].date));
            }
        }

        if let Some(bad) = points.iter().find(|p| !(p.close.is_finite() && p.close > 0.0)) {
            return Err(CoreError::InvalidPrice {
                date: bad.date,
                price: bad.close,
            });
        }

        Ok(Self { points })
    }

    /// Convenience constructor from `(date, close)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(date, close)| PricePoint::new(date, close))
                .collect(),
        )
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    /// Looks up the close on an exact date.
    pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn sorts_points_chronologically() {
        let series = PriceSeries::from_pairs([(d(3), 102.0), (d(1), 100.0), (d(2), 101.0)]).unwrap();
        let dates: Vec<_> = series.dates().collect();
        assert_eq!(dates, vec![d(1), d(2), d(3)]);
        assert_eq!(series.close_on(d(2)), Some(101.0));
        assert_eq!(series.close_on(d(4)), None);
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = PriceSeries::from_pairs([(d(1), 100.0), (d(1), 101.0)]).unwrap_err();
        assert_eq!(err, CoreError::DuplicateDate(d(1)));
    }

    #[test]
    fn rejects_non_positive_and_non_finite_prices() {
        for price in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let result = PriceSeries::from_pairs([(d(1), 100.0), (d(2), price)]);
            assert!(matches!(result, Err(CoreError::InvalidPrice { .. })), "accepted {price}");
        }
    }

    #[test]
    fn allows_short_series_at_construction() {
        let series = PriceSeries::from_pairs([(d(1), 100.0)]).unwrap();
        assert_eq!(series.len(), 1);
        assert!(PriceSeries::new(Vec::new()).unwrap().is_empty());
    }
}
