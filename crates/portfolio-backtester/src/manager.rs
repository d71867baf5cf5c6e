use crate::data_handler::normalize;
use crate::error::PortfolioError;
use analytics::{AnalyticsEngine, MetricsSummary, MonthlyReturn};
use chrono::NaiveDate;
use core_types::{PriceSeries, PriceTable, WeightVector};
use serde::Serialize;
use std::collections::BTreeMap;

/// Largest accepted distance between the sum of supplied weights and 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Run-time settings of the engine, passed in explicitly for every backtester.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BacktestParams {
    /// Capital converted into shares on the first date.
    pub initial_investment: f64,
    /// Annual risk-free rate used by the Sharpe ratio.
    pub risk_free_rate: f64,
}

impl BacktestParams {
    pub fn new(initial_investment: f64) -> Self {
        Self {
            initial_investment,
            risk_free_rate: 0.0,
        }
    }

    pub fn with_risk_free_rate(mut self, risk_free_rate: f64) -> Self {
        self.risk_free_rate = risk_free_rate;
        self
    }
}

impl Default for BacktestParams {
    fn default() -> Self {
        Self::new(10_000.0)
    }
}

/// The outcome of one buy-and-hold backtest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    /// Portfolio value on every date of the price table.
    pub equity_curve: Vec<(NaiveDate, f64)>,
    pub initial_investment: f64,
    /// The weights actually applied, one entry per ticker of the table.
    pub weights: BTreeMap<String, f64>,
    /// Fractional shares bought on the first date and held throughout.
    pub shares: BTreeMap<String, f64>,
    pub metrics: MetricsSummary,
}

impl BacktestResult {
    pub fn final_value(&self) -> f64 {
        self.equity_curve.last().map(|&(_, v)| v).unwrap_or(self.initial_investment)
    }

    pub fn daily_returns(&self) -> Vec<(NaiveDate, f64)> {
        AnalyticsEngine::daily_returns(&self.equity_curve)
    }

    pub fn drawdown_series(&self) -> Vec<(NaiveDate, f64)> {
        AnalyticsEngine::drawdown_series(&self.equity_curve)
    }

    pub fn monthly_returns(&self) -> Vec<MonthlyReturn> {
        AnalyticsEngine::monthly_returns(&self.equity_curve)
    }
}

/// A portfolio run and a single-ticker benchmark run, side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkComparison {
    pub benchmark_ticker: String,
    pub portfolio: BacktestResult,
    pub benchmark: BacktestResult,
    /// Portfolio total return minus benchmark total return.
    pub excess_total_return: f64,
    pub excess_annualized_return: Option<f64>,
}

impl BenchmarkComparison {
    pub fn new(benchmark_ticker: String, portfolio: BacktestResult, benchmark: BacktestResult) -> Self {
        let excess_total_return = portfolio.metrics.total_return - benchmark.metrics.total_return;
        let excess_annualized_return = portfolio
            .metrics
            .annualized_return
            .zip(benchmark.metrics.annualized_return)
            .map(|(p, b)| p - b);

        Self {
            benchmark_ticker,
            portfolio,
            benchmark,
            excess_total_return,
            excess_annualized_return,
        }
    }
}

/// The buy-and-hold backtest engine.
#[derive(Debug, Clone)]
pub struct PortfolioBacktester {
    params: BacktestParams,
    analytics_engine: AnalyticsEngine,
}

impl PortfolioBacktester {
    pub fn new(params: BacktestParams) -> Self {
        Self {
            params,
            analytics_engine: AnalyticsEngine::with_risk_free_rate(params.risk_free_rate),
        }
    }

    pub fn params(&self) -> &BacktestParams {
        &self.params
    }

    /// Runs the backtest over an aligned price table.
    ///
    /// `weights` defaults to an equal allocation across the table's tickers
    /// when `None`. All inputs are validated before any share is allocated:
    /// the investment first, then the table length, then the weights.
    pub fn run(
        &self,
        table: &PriceTable,
        weights: Option<&WeightVector>,
    ) -> Result<BacktestResult, PortfolioError> {
        let initial_investment = self.params.initial_investment;
        if !(initial_investment.is_finite() && initial_investment > 0.0) {
            return Err(PortfolioError::InvalidInvestment(initial_investment));
        }

        if table.len() < 2 {
            return Err(PortfolioError::InsufficientData(format!(
                "price table has {} date(s), at least 2 are required",
                table.len()
            )));
        }

        if !self.params.risk_free_rate.is_finite() {
            return Err(analytics::AnalyticsError::InvalidRiskFreeRate(self.params.risk_free_rate).into());
        }

        let applied = resolve_weights(table, weights)?;

        // 1. Buy on the first date.
        let first_row = table.row(0).ok_or_else(|| {
            PortfolioError::InsufficientData("price table has no first date".to_string())
        })?;
        let shares: Vec<f64> = applied
            .values()
            .zip(first_row.values())
            .map(|(w, price)| initial_investment * w / price)
            .collect();

        tracing::debug!(?applied, ?shares, "Allocated initial shares.");

        // 2. Hold and value the position on every date.
        let equity_curve: Vec<(NaiveDate, f64)> = table
            .iter()
            .map(|(date, row)| {
                let value = row.values().zip(&shares).map(|(price, n)| price * n).sum::<f64>();
                (date, value)
            })
            .collect();

        // 3. Summarize.
        let metrics = self.analytics_engine.calculate(&equity_curve)?;

        let shares = table.tickers().iter().cloned().zip(shares).collect();

        tracing::info!(
            tickers = table.tickers().len(),
            dates = table.len(),
            final_value = equity_curve.last().map(|&(_, v)| v),
            total_return = metrics.total_return,
            "Backtest complete."
        );

        Ok(BacktestResult {
            equity_curve,
            initial_investment,
            weights: applied,
            shares,
            metrics,
        })
    }

    /// Backtests the portfolio and a single-ticker benchmark independently.
    ///
    /// Each side is normalized on its own dates and the two runs execute
    /// concurrently on blocking worker threads. Either failure fails the
    /// comparison.
    pub async fn run_with_benchmark(
        &self,
        series: BTreeMap<String, PriceSeries>,
        weights: Option<WeightVector>,
        benchmark_ticker: String,
        benchmark_series: PriceSeries,
    ) -> Result<BenchmarkComparison, PortfolioError> {
        let portfolio_runner = self.clone();
        let portfolio_task = tokio::task::spawn_blocking(move || {
            let table = normalize(&series)?;
            portfolio_runner.run(&table, weights.as_ref())
        });

        let benchmark_runner = self.clone();
        let ticker = benchmark_ticker.clone();
        let benchmark_task = tokio::task::spawn_blocking(move || {
            let table = normalize(&BTreeMap::from([(ticker, benchmark_series)]))?;
            benchmark_runner.run(&table, None)
        });

        let (portfolio, benchmark) = tokio::try_join!(portfolio_task, benchmark_task)?;

        Ok(BenchmarkComparison::new(benchmark_ticker, portfolio?, benchmark?))
    }
}

/// Backtests `table` with a zero risk-free rate.
pub fn run_backtest(
    table: &PriceTable,
    weights: Option<&WeightVector>,
    initial_investment: f64,
) -> Result<BacktestResult, PortfolioError> {
    PortfolioBacktester::new(BacktestParams::new(initial_investment)).run(table, weights)
}

/// Checks `weights` against the table and expands them to one entry per
/// ticker of the table, in ticker order. Tickers without a weight get zero.
fn resolve_weights(
    table: &PriceTable,
    weights: Option<&WeightVector>,
) -> Result<BTreeMap<String, f64>, PortfolioError> {
    let Some(weights) = weights else {
        let equal = WeightVector::equal(table.tickers().iter().cloned());
        return Ok(equal.iter().map(|(t, w)| (t.to_string(), w)).collect());
    };

    for (ticker, w) in weights.iter() {
        if !(w.is_finite() && w >= 0.0) {
            return Err(PortfolioError::InvalidWeight(format!(
                "weight for {ticker} is {w}, weights must be non-negative"
            )));
        }
        if !table.has_ticker(ticker) {
            return Err(PortfolioError::InvalidWeight(format!(
                "{ticker} has a weight but no prices"
            )));
        }
    }

    // Equal vectors sum to 1.0 as well, so every supplied vector is held to it.
    let sum = weights.sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(PortfolioError::InvalidWeight(format!(
            "weights sum to {sum}, expected 1.0"
        )));
    }

    Ok(table
        .tickers()
        .iter()
        .map(|t| (t.clone(), weights.get(t).unwrap_or(0.0)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, day).unwrap()
    }

    fn table(rows: &[(u32, &[(&str, f64)])]) -> PriceTable {
        let tickers = rows[0].1.iter().map(|(t, _)| t.to_string()).collect();
        PriceTable::new(
            tickers,
            rows.iter()
                .map(|(day, prices)| {
                    (d(*day), prices.iter().map(|(t, p)| (t.to_string(), *p)).collect())
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn omitted_tickers_get_zero_weight() {
        let t = table(&[
            (1, &[("AAPL", 10.0), ("MSFT", 20.0)]),
            (2, &[("AAPL", 12.0), ("MSFT", 10.0)]),
        ]);
        let w = WeightVector::custom(BTreeMap::from([("AAPL".to_string(), 1.0)]));
        let result = run_backtest(&t, Some(&w), 100.0).unwrap();

        assert_eq!(result.shares.get("MSFT"), Some(&0.0));
        assert_eq!(result.shares.get("AAPL"), Some(&10.0));
        assert_eq!(result.final_value(), 120.0);
    }

    #[test]
    fn weight_sum_tolerance_is_honoured() {
        let t = table(&[(1, &[("A", 1.0), ("B", 1.0)]), (2, &[("A", 1.0), ("B", 1.0)])]);

        let close = WeightVector::custom(BTreeMap::from([
            ("A".to_string(), 0.5),
            ("B".to_string(), 0.5 + 5e-7),
        ]));
        assert!(run_backtest(&t, Some(&close), 1.0).is_ok());

        let off = WeightVector::custom(BTreeMap::from([
            ("A".to_string(), 0.5),
            ("B".to_string(), 0.49),
        ]));
        assert!(matches!(
            run_backtest(&t, Some(&off), 1.0),
            Err(PortfolioError::InvalidWeight(_))
        ));
    }

    #[test]
    fn investment_is_checked_before_weights() {
        let t = table(&[(1, &[("A", 1.0)]), (2, &[("A", 1.0)])]);
        let bad = WeightVector::custom(BTreeMap::from([("A".to_string(), -1.0)]));
        assert!(matches!(
            run_backtest(&t, Some(&bad), 0.0),
            Err(PortfolioError::InvalidInvestment(_))
        ));
        assert!(matches!(
            run_backtest(&t, None, f64::NAN),
            Err(PortfolioError::InvalidInvestment(_))
        ));
    }

    #[test]
    fn single_date_table_is_insufficient() {
        let t = table(&[(1, &[("A", 1.0)])]);
        assert!(matches!(
            run_backtest(&t, None, 100.0),
            Err(PortfolioError::InsufficientData(_))
        ));
    }

    #[test]
    fn benchmark_comparison_subtracts_returns() {
        let t = table(&[(1, &[("A", 100.0)]), (2, &[("A", 110.0)])]);
        let b = table(&[(1, &[("SPY", 100.0)]), (2, &[("SPY", 105.0)])]);
        let comparison = BenchmarkComparison::new(
            "SPY".to_string(),
            run_backtest(&t, None, 1000.0).unwrap(),
            run_backtest(&b, None, 1000.0).unwrap(),
        );

        assert!((comparison.excess_total_return - 0.05).abs() < 1e-12);
        // One day of history: neither side is annualized.
        assert_eq!(comparison.excess_annualized_return, None);
    }
}
