use crate::error::ConfigError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub backtest: BacktestSettings,
    #[serde(default)]
    pub data: DataSettings,
}

/// Contains parameters for a single backtest run.
#[derive(Debug, Clone, Deserialize)]
pub struct BacktestSettings {
    /// The tickers held by the portfolio (e.g., "AAPL").
    pub tickers: Vec<String>,
    /// Optional explicit allocation; equal weight across `tickers` when omitted.
    #[serde(default)]
    pub weights: Option<BTreeMap<String, Decimal>>,
    /// The first date of the backtest period.
    pub start_date: NaiveDate,
    /// The last date of the backtest period.
    pub end_date: NaiveDate,
    /// The capital invested on the first trading day.
    pub initial_investment: Decimal,
    /// Annual risk-free rate used by the Sharpe ratio. 0.04 corresponds to 4%.
    #[serde(default)]
    pub risk_free_rate: Decimal,
    /// A single ticker to backtest alongside the portfolio for comparison.
    #[serde(default)]
    pub benchmark: Option<String>,
}

/// Where the price files live.
#[derive(Debug, Clone, Deserialize)]
pub struct DataSettings {
    pub directory: PathBuf,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data"),
        }
    }
}

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct CliOverrides {
    /// Override the first date of the backtest (format: YYYY-MM-DD).
    #[cfg_attr(feature = "clap", arg(long))]
    pub start: Option<NaiveDate>,

    /// Override the last date of the backtest (format: YYYY-MM-DD).
    #[cfg_attr(feature = "clap", arg(long))]
    pub end: Option<NaiveDate>,

    /// Override the initial investment.
    #[cfg_attr(feature = "clap", arg(long))]
    pub initial_investment: Option<Decimal>,

    /// Override the annual risk-free rate.
    #[cfg_attr(feature = "clap", arg(long))]
    pub risk_free_rate: Option<Decimal>,

    /// Override the benchmark ticker.
    #[cfg_attr(feature = "clap", arg(long))]
    pub benchmark: Option<String>,

    /// Override the directory holding the price files.
    #[cfg_attr(feature = "clap", arg(long))]
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Upper-cases ticker symbols so that file keys and CSV names agree.
    pub fn normalize(&mut self) {
        let bt = &mut self.backtest;
        for ticker in bt.tickers.iter_mut() {
            *ticker = ticker.trim().to_uppercase();
        }
        if let Some(weights) = bt.weights.take() {
            bt.weights = Some(
                weights
                    .into_iter()
                    .map(|(t, w)| (t.trim().to_uppercase(), w))
                    .collect(),
            );
        }
        if let Some(benchmark) = bt.benchmark.as_mut() {
            *benchmark = benchmark.trim().to_uppercase();
        }
    }

    /// Applies command-line overrides, then re-validates.
    pub fn apply_overrides(&mut self, overrides: &CliOverrides) -> Result<(), ConfigError> {
        let bt = &mut self.backtest;
        if let Some(start) = overrides.start {
            bt.start_date = start;
        }
        if let Some(end) = overrides.end {
            bt.end_date = end;
        }
        if let Some(amount) = overrides.initial_investment {
            bt.initial_investment = amount;
        }
        if let Some(rate) = overrides.risk_free_rate {
            bt.risk_free_rate = rate;
        }
        if let Some(benchmark) = &overrides.benchmark {
            bt.benchmark = Some(benchmark.clone());
        }
        if let Some(dir) = &overrides.data_dir {
            self.data.directory = dir.clone();
        }
        self.normalize();
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bt = &self.backtest;

        if bt.tickers.is_empty() {
            return Err(ConfigError::ValidationError(
                "backtest.tickers must list at least one ticker".to_string(),
            ));
        }
        let mut seen = BTreeSet::new();
        for ticker in &bt.tickers {
            if ticker.is_empty() {
                return Err(ConfigError::ValidationError(
                    "backtest.tickers contains an empty symbol".to_string(),
                ));
            }
            if !seen.insert(ticker) {
                return Err(ConfigError::ValidationError(format!(
                    "backtest.tickers lists '{ticker}' more than once"
                )));
            }
        }

        if bt.start_date >= bt.end_date {
            return Err(ConfigError::ValidationError(format!(
                "backtest.start_date ({}) must be before backtest.end_date ({})",
                bt.start_date, bt.end_date
            )));
        }

        if bt.initial_investment <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "backtest.initial_investment must be positive, got {}",
                bt.initial_investment
            )));
        }

        bt.initial_investment_f64()?;
        bt.risk_free_rate_f64()?;
        bt.weights_f64()?;
        Ok(())
    }
}

impl BacktestSettings {
    pub fn initial_investment_f64(&self) -> Result<f64, ConfigError> {
        to_f64("backtest.initial_investment", self.initial_investment)
    }

    pub fn risk_free_rate_f64(&self) -> Result<f64, ConfigError> {
        to_f64("backtest.risk_free_rate", self.risk_free_rate)
    }

    /// The explicit weights as floating point, or `None` for equal weight.
    pub fn weights_f64(&self) -> Result<Option<BTreeMap<String, f64>>, ConfigError> {
        self.weights
            .as_ref()
            .map(|weights| {
                weights
                    .iter()
                    .map(|(ticker, w)| {
                        to_f64(&format!("backtest.weights.{ticker}"), *w)
                            .map(|w| (ticker.clone(), w))
                    })
                    .collect()
            })
            .transpose()
    }
}

fn to_f64(field: &str, value: Decimal) -> Result<f64, ConfigError> {
    value
        .to_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ConfigError::ValidationError(format!("{field} ({value}) is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn settings() -> Config {
        Config {
            backtest: BacktestSettings {
                tickers: vec!["aapl".into(), " msft ".into()],
                weights: None,
                start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                initial_investment: dec!(10000),
                risk_free_rate: Decimal::ZERO,
                benchmark: Some("spy".into()),
            },
            data: DataSettings::default(),
        }
    }

    #[test]
    fn normalize_upper_cases_symbols() {
        let mut config = settings();
        config.backtest.weights = Some(BTreeMap::from([("aapl".to_string(), dec!(1))]));
        config.normalize();

        assert_eq!(config.backtest.tickers, vec!["AAPL", "MSFT"]);
        assert_eq!(config.backtest.benchmark.as_deref(), Some("SPY"));
        assert!(config.backtest.weights.unwrap().contains_key("AAPL"));
    }

    #[test]
    fn valid_settings_pass() {
        let mut config = settings();
        config.normalize();
        assert!(config.validate().is_ok());
        assert_eq!(config.backtest.initial_investment_f64().unwrap(), 10000.0);
        assert_eq!(config.backtest.weights_f64().unwrap(), None);
    }

    #[test]
    fn rejects_inverted_dates_and_bad_amounts() {
        let mut config = settings();
        config.backtest.end_date = config.backtest.start_date;
        assert!(config.validate().is_err());

        let mut config = settings();
        config.backtest.initial_investment = dec!(-1);
        assert!(config.validate().is_err());

        let mut config = settings();
        config.backtest.tickers = Vec::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_tickers() {
        let mut config = settings();
        config.backtest.tickers = vec!["aapl".into(), "AAPL".into()];
        config.normalize();
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn overrides_take_precedence() {
        let mut config = settings();
        let overrides = CliOverrides {
            initial_investment: Some(dec!(2500.50)),
            risk_free_rate: Some(dec!(0.04)),
            benchmark: Some("qqq".into()),
            ..Default::default()
        };
        config.apply_overrides(&overrides).unwrap();

        assert_eq!(config.backtest.initial_investment_f64().unwrap(), 2500.5);
        assert_eq!(config.backtest.risk_free_rate_f64().unwrap(), 0.04);
        assert_eq!(config.backtest.benchmark.as_deref(), Some("QQQ"));
    }

    #[test]
    fn loads_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[backtest]
tickers = ["aapl", "tsla"]
start_date = "2020-01-01"
end_date = "2021-01-01"
initial_investment = 10000
risk_free_rate = 0.02

[backtest.weights]
AAPL = 0.6
TSLA = 0.4

[data]
directory = "prices"
"#,
        )
        .unwrap();

        let config = crate::load_config(&path).unwrap();
        assert_eq!(config.backtest.tickers, vec!["AAPL", "TSLA"]);
        assert_eq!(config.data.directory, PathBuf::from("prices"));
        assert_eq!(config.backtest.benchmark, None);

        let weights = config.backtest.weights_f64().unwrap().unwrap();
        assert_eq!(weights.get("AAPL"), Some(&0.6));
        assert_eq!(weights.get("TSLA"), Some(&0.4));
    }
}
