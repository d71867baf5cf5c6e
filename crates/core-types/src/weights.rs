use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Target allocation of a portfolio, as a fraction of capital per ticker.
///
/// A vector is either *explicit* (supplied by the caller) or *equal* (built by
/// [`WeightVector::equal`], `1/N` per ticker). Either way it is expected to
/// sum to 1.0. No validation happens here; the backtest engine checks every
/// vector against the price table before simulating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    weights: BTreeMap<String, f64>,
    explicit: bool,
}

impl WeightVector {
    /// Caller-supplied weights.
    pub fn custom(weights: BTreeMap<String, f64>) -> Self {
        Self {
            weights,
            explicit: true,
        }
    }

    /// `1/N` for each distinct ticker.
    pub fn equal<I, S>(tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut weights: BTreeMap<String, f64> =
            tickers.into_iter().map(|t| (t.into(), 0.0)).collect();
        let share = 1.0 / weights.len() as f64;
        for w in weights.values_mut() {
            *w = share;
        }
        Self {
            weights,
            explicit: false,
        }
    }

    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    pub fn get(&self, ticker: &str) -> Option<f64> {
        self.weights.get(ticker).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(t, w)| (t.as_str(), *w))
    }

    pub fn sum(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl FromIterator<(String, f64)> for WeightVector {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self::custom(iter.into_iter().collect())
    }
}
