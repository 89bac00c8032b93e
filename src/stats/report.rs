//! # Report
//!
//! $$
//! R_i=\frac{S_{i,N}}{S_0}-1,\quad \mathrm{VaR}_\alpha=-Q_R(1-\alpha),\quad
//! \mathrm{CVaR}_\alpha=-\mathbb{E}[R\mid R\le Q_R(1-\alpha)]
//! $$
//!
//! Risk/return statistics over a path ensemble. All distributional figures
//! refer to final-step prices except drawdown, which is taken per path over
//! the whole trajectory.

use std::collections::BTreeMap;

use ndarray::ArrayView2;
use serde::Deserialize;
use serde::Serialize;
use statrs::distribution::ContinuousCDF;
use statrs::distribution::StudentsT;
use tracing::debug;

use super::drawdown::max_drawdowns;
use super::moments::CentralMoments;
use super::normality::dagostino_pearson;
use super::quantile::SortedSample;
use crate::error::AnalysisError;
use crate::stochastic::ensemble::PathEnsemble;

/// Percentile levels reported for the final-price distribution.
pub const PERCENTILE_LEVELS: [f64; 9] = [1.0, 5.0, 10.0, 25.0, 50.0, 75.0, 90.0, 95.0, 99.0];
/// Default VaR/CVaR confidence levels.
pub const DEFAULT_CONFIDENCES: [f64; 2] = [0.95, 0.99];
/// Two-sided 95% normal critical value.
const Z_95: f64 = 1.96;

/// Serialises non-finite floats as `null` and reads `null` back as NaN.
mod nan_as_null {
  use serde::Deserialize;
  use serde::Deserializer;
  use serde::Serializer;

  pub fn serialize<S: Serializer>(x: &f64, s: S) -> Result<S::Ok, S::Error> {
    if x.is_nan() {
      s.serialize_none()
    } else {
      s.serialize_f64(*x)
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::NAN))
  }
}

/// Value at a percentile level of the final-price distribution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Percentile {
  /// Level in percent, e.g. `5.0`.
  pub level: f64,
  pub price: f64,
}

/// Tail-risk figures at one confidence level. Losses are positive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TailRisk {
  pub confidence: f64,
  /// `-quantile(returns, 1 - confidence)`.
  pub var: f64,
  /// Mean loss over returns at or below the VaR quantile.
  pub cvar: f64,
  /// `initial_price - quantile(final_prices, 1 - confidence)`.
  pub dollar_var: f64,
}

/// Risk/return statistics of one ensemble. Either fully computed or not
/// produced at all.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatisticsRecord {
  pub initial_price: f64,
  pub paths: usize,
  pub steps: usize,
  pub risk_free_rate: f64,

  pub mean_final_price: f64,
  pub median_final_price: f64,
  pub std_final_price: f64,
  pub min_final_price: f64,
  pub max_final_price: f64,
  pub percentiles: Vec<Percentile>,

  pub mean_return: f64,
  pub median_return: f64,
  pub std_return: f64,
  #[serde(with = "nan_as_null")]
  pub skewness: f64,
  #[serde(with = "nan_as_null")]
  pub excess_kurtosis: f64,
  pub return_ci_lower: f64,
  pub return_ci_upper: f64,
  #[serde(with = "nan_as_null")]
  pub t_stat: f64,
  #[serde(with = "nan_as_null")]
  pub p_value: f64,
  /// D'Agostino-Pearson `K^2` of the returns. NaN below eight paths.
  #[serde(with = "nan_as_null")]
  pub normality_statistic: f64,
  #[serde(with = "nan_as_null")]
  pub normality_p_value: f64,

  pub tail_risk: Vec<TailRisk>,

  pub prob_profit: f64,
  pub prob_loss: f64,
  pub prob_up_10: f64,
  pub prob_up_20: f64,
  pub prob_down_10: f64,
  pub prob_down_20: f64,

  pub max_drawdown_mean: f64,
  pub max_drawdown_median: f64,
  pub max_drawdown_worst: f64,

  /// NaN when every path has the same return.
  #[serde(with = "nan_as_null")]
  pub sharpe_ratio: f64,
  /// NaN when the downside deviation is zero or undefined.
  #[serde(with = "nan_as_null")]
  pub sortino_ratio: f64,
}

impl StatisticsRecord {
  pub fn tail(&self, confidence: f64) -> Option<&TailRisk> {
    self
      .tail_risk
      .iter()
      .find(|t| (t.confidence - confidence).abs() < 1e-12)
  }

  pub fn var(&self, confidence: f64) -> Option<f64> {
    self.tail(confidence).map(|t| t.var)
  }

  pub fn cvar(&self, confidence: f64) -> Option<f64> {
    self.tail(confidence).map(|t| t.cvar)
  }

  /// Flat `name -> value` view for templating and key-value persistence.
  pub fn to_flat_map(&self) -> BTreeMap<String, f64> {
    let mut map = BTreeMap::new();
    let mut put = |k: &str, v: f64| {
      map.insert(k.to_string(), v);
    };

    put("initial_price", self.initial_price);
    put("paths", self.paths as f64);
    put("steps", self.steps as f64);
    put("risk_free_rate", self.risk_free_rate);
    put("mean_final_price", self.mean_final_price);
    put("median_final_price", self.median_final_price);
    put("std_final_price", self.std_final_price);
    put("min_final_price", self.min_final_price);
    put("max_final_price", self.max_final_price);
    put("mean_return", self.mean_return);
    put("median_return", self.median_return);
    put("std_return", self.std_return);
    put("skewness", self.skewness);
    put("excess_kurtosis", self.excess_kurtosis);
    put("return_ci_lower", self.return_ci_lower);
    put("return_ci_upper", self.return_ci_upper);
    put("t_stat", self.t_stat);
    put("p_value", self.p_value);
    put("normality_statistic", self.normality_statistic);
    put("normality_p_value", self.normality_p_value);
    put("prob_profit", self.prob_profit);
    put("prob_loss", self.prob_loss);
    put("prob_up_10", self.prob_up_10);
    put("prob_up_20", self.prob_up_20);
    put("prob_down_10", self.prob_down_10);
    put("prob_down_20", self.prob_down_20);
    put("max_drawdown_mean", self.max_drawdown_mean);
    put("max_drawdown_median", self.max_drawdown_median);
    put("max_drawdown_worst", self.max_drawdown_worst);
    put("sharpe_ratio", self.sharpe_ratio);
    put("sortino_ratio", self.sortino_ratio);

    for p in &self.percentiles {
      put(&format!("p{}", percent_label(p.level / 100.0)), p.price);
    }
    for t in &self.tail_risk {
      let label = percent_label(t.confidence);
      put(&format!("var_{label}"), t.var);
      put(&format!("cvar_{label}"), t.cvar);
      put(&format!("dollar_var_{label}"), t.dollar_var);
    }

    map
  }
}

fn percent_label(fraction: f64) -> String {
  format!("{}", (fraction * 1e4).round() / 1e2)
}

/// Statistics at the default 95% and 99% confidence levels.
pub fn analyze(
  ensemble: &PathEnsemble,
  initial_price: f64,
  risk_free_rate: f64,
) -> Result<StatisticsRecord, AnalysisError> {
  analyze_with_confidences(ensemble, initial_price, risk_free_rate, &DEFAULT_CONFIDENCES)
}

/// Analyze a path set given as rows, rejecting ragged input.
pub fn analyze_rows(
  rows: &[Vec<f64>],
  initial_price: f64,
  risk_free_rate: f64,
) -> Result<StatisticsRecord, AnalysisError> {
  let width = rows.first().map(Vec::len).unwrap_or(0);
  if let Some(i) = rows.iter().position(|r| r.len() != width) {
    return Err(AnalysisError::InvalidEnsemble(format!(
      "ragged ensemble: row {i} has {} columns, expected {width}",
      rows[i].len()
    )));
  }

  let flat: Vec<f64> = rows.iter().flatten().copied().collect();
  let prices = ndarray::Array2::from_shape_vec((rows.len(), width), flat)
    .map_err(|err| AnalysisError::InvalidEnsemble(err.to_string()))?;
  analyze(&PathEnsemble::from_array(prices), initial_price, risk_free_rate)
}

#[tracing::instrument(skip(ensemble), fields(paths = ensemble.paths(), steps = ensemble.steps()))]
pub fn analyze_with_confidences(
  ensemble: &PathEnsemble,
  initial_price: f64,
  risk_free_rate: f64,
  confidences: &[f64],
) -> Result<StatisticsRecord, AnalysisError> {
  let view = ensemble.view();
  validate(view, initial_price, risk_free_rate, confidences)?;

  let final_prices = ensemble.final_prices().to_vec();
  let returns: Vec<f64> = final_prices
    .iter()
    .map(|p| p / initial_price - 1.0)
    .collect();
  let n = returns.len() as f64;

  let price_moments = CentralMoments::parallel(&final_prices);
  let return_moments = CentralMoments::parallel(&returns);
  let sorted_prices = SortedSample::new(final_prices);
  let sorted_returns = SortedSample::new(returns);

  let percentiles = PERCENTILE_LEVELS
    .iter()
    .map(|&level| Percentile {
      level,
      price: sorted_prices.quantile(level / 100.0),
    })
    .collect();

  let tail_risk = confidences
    .iter()
    .map(|&confidence| {
      let threshold = sorted_returns.quantile(1.0 - confidence);
      let tail = sorted_returns.tail_at_or_below(threshold);
      TailRisk {
        confidence,
        var: -threshold,
        cvar: -(tail.iter().sum::<f64>() / tail.len() as f64),
        dollar_var: initial_price - sorted_prices.quantile(1.0 - confidence),
      }
    })
    .collect();

  let r = sorted_returns.as_slice();
  let fraction = |pred: fn(f64) -> bool| r.iter().filter(|&&x| pred(x)).count() as f64 / n;

  let mean_return = return_moments.mean;
  let std_return = return_moments.std_dev();
  let excess = mean_return - risk_free_rate;
  let sharpe_ratio = ratio_or_nan(excess, std_return);

  let downside = &r[..r.partition_point(|&x| x < 0.0)];
  let downside_deviation = CentralMoments::serial(downside).std_dev();
  let sortino_ratio = ratio_or_nan(excess, downside_deviation);

  let std_error = std_return / n.sqrt();
  let (t_stat, p_value) = t_test(&return_moments);
  let normality = dagostino_pearson(&return_moments);

  let drawdowns = max_drawdowns(view);
  let max_drawdown_mean = drawdowns.iter().sum::<f64>() / drawdowns.len() as f64;
  let drawdowns = SortedSample::new(drawdowns);

  let record = StatisticsRecord {
    initial_price,
    paths: ensemble.paths(),
    steps: ensemble.steps(),
    risk_free_rate,
    mean_final_price: price_moments.mean,
    median_final_price: sorted_prices.median(),
    std_final_price: price_moments.std_dev(),
    min_final_price: sorted_prices.min(),
    max_final_price: sorted_prices.max(),
    percentiles,
    mean_return,
    median_return: sorted_returns.median(),
    std_return,
    skewness: return_moments.skewness(),
    excess_kurtosis: return_moments.excess_kurtosis(),
    return_ci_lower: mean_return - Z_95 * std_error,
    return_ci_upper: mean_return + Z_95 * std_error,
    t_stat,
    p_value,
    normality_statistic: normality.statistic,
    normality_p_value: normality.p_value,
    tail_risk,
    prob_profit: fraction(|x| x > 0.0),
    prob_loss: fraction(|x| x < 0.0),
    prob_up_10: fraction(|x| x > 0.10),
    prob_up_20: fraction(|x| x > 0.20),
    prob_down_10: fraction(|x| x < -0.10),
    prob_down_20: fraction(|x| x < -0.20),
    max_drawdown_mean,
    max_drawdown_median: drawdowns.median(),
    max_drawdown_worst: drawdowns.max(),
    sharpe_ratio,
    sortino_ratio,
  };

  debug!(
    mean_return = record.mean_return,
    std_return = record.std_return,
    prob_profit = record.prob_profit,
    "ensemble analyzed"
  );

  Ok(record)
}

fn ratio_or_nan(numerator: f64, denominator: f64) -> f64 {
  if denominator > 0.0 && denominator.is_finite() {
    numerator / denominator
  } else {
    f64::NAN
  }
}

/// One-sample t statistic against zero and its two-sided p-value.
fn t_test(m: &CentralMoments) -> (f64, f64) {
  let s = m.sample_variance().sqrt();
  if !(s > 0.0) {
    return (f64::NAN, f64::NAN);
  }

  let t = m.mean / (s / (m.n as f64).sqrt());
  let p = match StudentsT::new(0.0, 1.0, (m.n - 1) as f64) {
    Ok(dist) => 2.0 * (1.0 - dist.cdf(t.abs())),
    Err(_) => f64::NAN,
  };
  (t, p)
}

fn validate(
  view: ArrayView2<f64>,
  initial_price: f64,
  risk_free_rate: f64,
  confidences: &[f64],
) -> Result<(), AnalysisError> {
  if view.nrows() == 0 || view.ncols() == 0 {
    return Err(AnalysisError::InvalidEnsemble(format!(
      "ensemble must be non-empty, got shape {:?}",
      view.shape()
    )));
  }
  if let Some(((i, j), p)) = view.indexed_iter().find(|(_, p)| !p.is_finite()) {
    return Err(AnalysisError::InvalidEnsemble(format!(
      "non-finite price {p} at path {i}, step {j}"
    )));
  }
  if !(initial_price.is_finite() && initial_price > 0.0) {
    return Err(AnalysisError::InvalidEnsemble(format!(
      "initial price must be finite and > 0, got {initial_price}"
    )));
  }
  if !risk_free_rate.is_finite() {
    return Err(AnalysisError::InvalidEnsemble(
      "risk-free rate must be finite".into(),
    ));
  }
  if let Some(c) = confidences.iter().find(|c| !(**c > 0.0 && **c < 1.0)) {
    return Err(AnalysisError::InvalidEnsemble(format!(
      "confidence must lie in (0, 1), got {c}"
    )));
  }

  Ok(())
}
