use crate::error::AnalyticsError;
use crate::report::{MetricsSummary, MonthlyReturn};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Assumed number of trading sessions in a year, used to annualize volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Length of the average calendar year, used to annualize returns.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Shortest calendar span, in days, for which annualized metrics are reported.
pub const MIN_ANNUALIZATION_DAYS: i64 = 7;

/// Annualized volatility at or below this is treated as zero. Returns that are
/// equal up to rounding leave a residual deviation of a few ulps, which would
/// otherwise turn the Sharpe ratio into a meaningless huge number.
pub const MIN_VOLATILITY: f64 = 1e-12;

/// A stateless calculator for deriving performance metrics from an equity curve.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnalyticsEngine {
    risk_free_rate: f64,
}

impl AnalyticsEngine {
    /// An engine using a zero risk-free rate.
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine using the given annual risk-free rate for the Sharpe ratio.
    pub fn with_risk_free_rate(risk_free_rate: f64) -> Self {
        Self { risk_free_rate }
    }

    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    /// The main entry point for calculating performance metrics.
    ///
    /// # Arguments
    ///
    /// * `equity_curve` - Portfolio value per date, dates strictly increasing.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `MetricsSummary` or an `AnalyticsError` when
    /// the curve has fewer than two points, is out of order, or holds a value
    /// that is not positive and finite.
    pub fn calculate(
        &self,
        equity_curve: &[(NaiveDate, f64)],
    ) -> Result<MetricsSummary, AnalyticsError> {
        if !self.risk_free_rate.is_finite() {
            return Err(AnalyticsError::InvalidRiskFreeRate(self.risk_free_rate));
        }
        validate_curve(equity_curve)?;

        let (start_date, first) = equity_curve[0];
        let (end_date, last) = equity_curve[equity_curve.len() - 1];

        let span_days = (end_date - start_date).num_days();
        let years = span_days as f64 / DAYS_PER_YEAR;
        let total_return = last / first - 1.0;

        let returns: Vec<f64> = Self::daily_returns(equity_curve)
            .into_iter()
            .map(|(_, r)| r)
            .collect();

        let (annualized_return, annualized_volatility) = if span_days >= MIN_ANNUALIZATION_DAYS {
            let annualized_return = (1.0 + total_return).powf(1.0 / years) - 1.0;
            let annualized_volatility =
                sample_std_dev(&returns).map(|sd| sd * TRADING_DAYS_PER_YEAR.sqrt());
            (
                finite_or_undefined("annualized_return", Some(annualized_return)),
                finite_or_undefined("annualized_volatility", annualized_volatility),
            )
        } else {
            tracing::warn!(
                span_days,
                "Equity curve spans fewer than {} days; annualized metrics are undefined.",
                MIN_ANNUALIZATION_DAYS
            );
            (None, None)
        };

        let sharpe_ratio = match (annualized_return, annualized_volatility) {
            (Some(ret), Some(vol)) if vol > MIN_VOLATILITY => {
                finite_or_undefined("sharpe_ratio", Some((ret - self.risk_free_rate) / vol))
            }
            _ => None,
        };

        let max_drawdown = Self::drawdown_series(equity_curve)
            .into_iter()
            .map(|(_, dd)| dd)
            .fold(0.0_f64, f64::min);

        tracing::debug!(
            points = equity_curve.len(),
            total_return,
            ?annualized_return,
            ?annualized_volatility,
            ?sharpe_ratio,
            max_drawdown,
            "Calculated equity curve metrics."
        );

        Ok(MetricsSummary {
            start_date,
            end_date,
            years,
            total_return,
            annualized_return,
            annualized_volatility,
            sharpe_ratio,
            max_drawdown,
        })
    }

    /// Simple returns `V[i]/V[i-1] - 1`, dated by the later observation.
    pub fn daily_returns(equity_curve: &[(NaiveDate, f64)]) -> Vec<(NaiveDate, f64)> {
        equity_curve
            .windows(2)
            .map(|w| (w[1].0, w[1].1 / w[0].1 - 1.0))
            .collect()
    }

    /// Decline from the running peak at every date, `V[i]/max(V[0..=i]) - 1`.
    ///
    /// Values are zero at new highs and negative otherwise.
    pub fn drawdown_series(equity_curve: &[(NaiveDate, f64)]) -> Vec<(NaiveDate, f64)> {
        let mut peak = f64::MIN;
        equity_curve
            .iter()
            .map(|&(date, value)| {
                peak = peak.max(value);
                (date, value / peak - 1.0)
            })
            .collect()
    }

    /// Daily returns compounded per calendar month, `prod(1 + r) - 1`.
    ///
    /// Each daily return is attributed to the month of its later date, so the
    /// first month only covers the sessions after the first observation.
    pub fn monthly_returns(equity_curve: &[(NaiveDate, f64)]) -> Vec<MonthlyReturn> {
        let mut growth: BTreeMap<(i32, u32), f64> = BTreeMap::new();
        for (date, r) in Self::daily_returns(equity_curve) {
            *growth.entry((date.year(), date.month())).or_insert(1.0) *= 1.0 + r;
        }

        growth
            .into_iter()
            .map(|((year, month), g)| MonthlyReturn {
                year,
                month,
                value: g - 1.0,
            })
            .collect()
    }
}

fn validate_curve(equity_curve: &[(NaiveDate, f64)]) -> Result<(), AnalyticsError> {
    if equity_curve.len() < 2 {
        return Err(AnalyticsError::NotEnoughData(format!(
            "equity curve has {} point(s), at least 2 are required",
            equity_curve.len()
        )));
    }

    if let Some(&(date, value)) = equity_curve
        .iter()
        .find(|(_, v)| !(v.is_finite() && *v > 0.0))
    {
        return Err(AnalyticsError::InvalidEquity { date, value });
    }

    if let Some(w) = equity_curve.windows(2).find(|w| w[1].0 <= w[0].0) {
        return Err(AnalyticsError::UnorderedDates(w[1].0));
    }

    Ok(())
}

/// Drops a metric that overflowed; short spans with extreme growth raise the
/// annualization exponent far enough to reach infinity.
fn finite_or_undefined(metric: &str, value: Option<f64>) -> Option<f64> {
    match value {
        Some(v) if !v.is_finite() => {
            tracing::warn!(metric, value = v, "Metric is not finite; reporting it as undefined.");
            None
        }
        other => other,
    }
}

/// Sample standard deviation (divides by `len - 1`); undefined below two values.
fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}
