//! # Returns
//!
//! $$
//! r_i=\ln\frac{S_i}{S_{i-1}},\quad \bar r=\frac1n\sum r_i,\quad \hat v=\frac1n\sum (r_i-\bar r)^2
//! $$
//!
//! Historical price series and their log-return preprocessing.

use chrono::Days;
use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;
use statrs::statistics::Statistics;

use crate::error::CalibrationError;

/// Ordered `(date, price)` observations with strictly increasing dates and
/// positive prices.
///
/// Serialized as a list of `[date, price]` pairs. Deserialization goes
/// through [`HistoricalSeries::new`], so it enforces the same invariants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
  try_from = "Vec<(NaiveDate, f64)>",
  into = "Vec<(NaiveDate, f64)>"
)]
pub struct HistoricalSeries {
  dates: Vec<NaiveDate>,
  prices: Vec<f64>,
}

impl HistoricalSeries {
  pub fn new(points: Vec<(NaiveDate, f64)>) -> Result<Self, CalibrationError> {
    let (dates, prices): (Vec<_>, Vec<_>) = points.into_iter().unzip();
    validate_prices(&prices)?;

    if let Some(index) = dates.windows(2).position(|w| w[1] <= w[0]) {
      return Err(CalibrationError::UnorderedTimestamps { index: index + 1 });
    }

    Ok(Self { dates, prices })
  }

  /// Build a series from prices alone, dated on consecutive days.
  pub fn from_prices(prices: &[f64]) -> Result<Self, CalibrationError> {
    let start = NaiveDate::default();
    let points = prices
      .iter()
      .enumerate()
      .map(|(i, &p)| (start + Days::new(i as u64), p))
      .collect();
    Self::new(points)
  }

  pub fn prices(&self) -> &[f64] {
    &self.prices
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn len(&self) -> usize {
    self.prices.len()
  }

  pub fn is_empty(&self) -> bool {
    self.prices.is_empty()
  }

  /// Most recent price, the default start of a simulation.
  pub fn last_price(&self) -> Option<f64> {
    self.prices.last().copied()
  }

  pub fn log_returns(&self) -> Result<ReturnSeries, CalibrationError> {
    ReturnSeries::from_prices(&self.prices)
  }
}

impl TryFrom<Vec<(NaiveDate, f64)>> for HistoricalSeries {
  type Error = CalibrationError;

  fn try_from(points: Vec<(NaiveDate, f64)>) -> Result<Self, Self::Error> {
    Self::new(points)
  }
}

impl From<HistoricalSeries> for Vec<(NaiveDate, f64)> {
  fn from(series: HistoricalSeries) -> Self {
    series.dates.into_iter().zip(series.prices).collect()
  }
}

/// Log returns with their sample mean and population variance.
#[derive(Clone, Debug, PartialEq)]
pub struct ReturnSeries {
  pub returns: Vec<f64>,
  pub mean: f64,
  /// `1/n` variance, the maximum-likelihood estimator.
  pub variance: f64,
}

impl ReturnSeries {
  pub fn from_prices(prices: &[f64]) -> Result<Self, CalibrationError> {
    if prices.len() < 2 {
      return Err(CalibrationError::insufficient(
        "log returns",
        2,
        prices.len(),
      ));
    }
    validate_prices(prices)?;

    let returns: Vec<f64> = prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
    Ok(Self::from_returns(returns))
  }

  pub fn from_returns(returns: Vec<f64>) -> Self {
    let mean = returns.iter().mean();
    let variance = returns.iter().population_variance();
    Self {
      returns,
      mean,
      variance,
    }
  }

  pub fn len(&self) -> usize {
    self.returns.len()
  }

  pub fn is_empty(&self) -> bool {
    self.returns.is_empty()
  }

  pub fn std_dev(&self) -> f64 {
    self.variance.sqrt()
  }
}

fn validate_prices(prices: &[f64]) -> Result<(), CalibrationError> {
  match prices
    .iter()
    .enumerate()
    .find(|(_, p)| !(p.is_finite() && **p > 0.0))
  {
    Some((index, &price)) => Err(CalibrationError::InvalidPrice { index, price }),
    None => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  #[test]
  fn log_returns_and_moments() {
    let rs = ReturnSeries::from_prices(&[100.0, 110.0, 99.0]).unwrap();

    assert_eq!(rs.len(), 2);
    assert_abs_diff_eq!(rs.returns[0], (1.1f64).ln(), epsilon = 1e-15);
    assert_abs_diff_eq!(rs.returns[1], (0.9f64).ln(), epsilon = 1e-15);

    let mean = (rs.returns[0] + rs.returns[1]) / 2.0;
    let var = ((rs.returns[0] - mean).powi(2) + (rs.returns[1] - mean).powi(2)) / 2.0;
    assert_abs_diff_eq!(rs.mean, mean, epsilon = 1e-15);
    assert_abs_diff_eq!(rs.variance, var, epsilon = 1e-15);
  }

  #[test]
  fn fewer_than_two_prices_is_insufficient() {
    let err = ReturnSeries::from_prices(&[100.0]).unwrap_err();
    assert!(matches!(
      err,
      CalibrationError::InsufficientData {
        required: 2,
        actual: 1,
        ..
      }
    ));
  }

  #[test]
  fn non_positive_price_is_rejected() {
    let err = ReturnSeries::from_prices(&[100.0, 0.0, 101.0]).unwrap_err();
    assert_eq!(
      err,
      CalibrationError::InvalidPrice {
        index: 1,
        price: 0.0
      }
    );
    assert!(HistoricalSeries::from_prices(&[100.0, -1.0]).is_err());
    assert!(HistoricalSeries::from_prices(&[100.0, f64::NAN]).is_err());
  }

  #[test]
  fn dates_must_increase() {
    let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let err = HistoricalSeries::new(vec![(d, 1.0), (d, 2.0)]).unwrap_err();
    assert_eq!(err, CalibrationError::UnorderedTimestamps { index: 1 });
  }

  #[test]
  fn deserializing_enforces_the_series_invariants() {
    let unordered = r#"[["2024-01-05", 100.0], ["2024-01-02", 101.0]]"#;
    let err = serde_json::from_str::<HistoricalSeries>(unordered).unwrap_err();
    assert!(err.to_string().contains("timestamp"), "{err}");

    let negative = r#"[["2024-01-02", 100.0], ["2024-01-03", -1.0]]"#;
    assert!(serde_json::from_str::<HistoricalSeries>(negative).is_err());
  }

  #[test]
  fn serialized_series_reads_back() {
    let series = HistoricalSeries::from_prices(&[10.0, 10.5, 9.75]).unwrap();
    let json = serde_json::to_string(&series).unwrap();
    assert!(json.starts_with("[["));
    let back: HistoricalSeries = serde_json::from_str(&json).unwrap();
    assert_eq!(back, series);
  }

  #[test]
  fn price_only_series_is_dated_consecutively() {
    let series = HistoricalSeries::from_prices(&[1.0, 2.0, 3.0]).unwrap();
    assert_eq!(series.len(), 3);
    assert_eq!(series.last_price(), Some(3.0));
    assert!(series.dates().windows(2).all(|w| w[1] > w[0]));
  }
}
