//! # Normality
//!
//! $$
//! K^2=Z(\sqrt{b_1})^2+Z(b_2)^2\ \sim\ \chi^2_2
//! $$
//!
//! D'Agostino-Pearson omnibus test built on the skewness and kurtosis
//! transforms of D'Agostino (1970) and Anscombe-Glynn (1983).

use serde::Deserialize;
use serde::Serialize;
use statrs::distribution::ChiSquared;
use statrs::distribution::ContinuousCDF;

use super::moments::CentralMoments;

/// Smallest sample the skewness transform is defined for.
pub const MIN_OBSERVATIONS: usize = 8;

/// Result of the D'Agostino-Pearson test. All fields are NaN when the
/// sample is too small or has no dispersion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalityTest {
  /// Normal score of the sample skewness.
  pub z_skewness: f64,
  /// Normal score of the sample kurtosis.
  pub z_kurtosis: f64,
  /// `K^2` statistic.
  pub statistic: f64,
  /// p-value under chi-square(2) asymptotics.
  pub p_value: f64,
}

impl NormalityTest {
  fn undefined() -> Self {
    Self {
      z_skewness: f64::NAN,
      z_kurtosis: f64::NAN,
      statistic: f64::NAN,
      p_value: f64::NAN,
    }
  }
}

pub fn dagostino_pearson(moments: &CentralMoments) -> NormalityTest {
  let skewness = moments.skewness();
  let kurtosis = moments.excess_kurtosis() + 3.0;
  if moments.n < MIN_OBSERVATIONS || !skewness.is_finite() || !kurtosis.is_finite() {
    return NormalityTest::undefined();
  }

  let n = moments.n as f64;
  let z_skewness = skewness_score(skewness, n);
  let z_kurtosis = kurtosis_score(kurtosis, n);
  let statistic = z_skewness * z_skewness + z_kurtosis * z_kurtosis;

  let p_value = match ChiSquared::new(2.0) {
    Ok(chi2) => chi2.sf(statistic).clamp(0.0, 1.0),
    Err(_) => f64::NAN,
  };

  NormalityTest {
    z_skewness,
    z_kurtosis,
    statistic,
    p_value,
  }
}

fn skewness_score(g1: f64, n: f64) -> f64 {
  let y = g1 * ((n + 1.0) * (n + 3.0) / (6.0 * (n - 2.0))).sqrt();
  let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
    / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
  let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
  let delta = 1.0 / (0.5 * w2.ln()).sqrt();
  let alpha = (2.0 / (w2 - 1.0)).sqrt();
  let u = y / alpha;
  delta * (u + (u * u + 1.0).sqrt()).ln()
}

fn kurtosis_score(b2: f64, n: f64) -> f64 {
  let expected = 3.0 * (n - 1.0) / (n + 1.0);
  let variance = 24.0 * n * (n - 2.0) * (n - 3.0) / ((n + 1.0).powi(2) * (n + 3.0) * (n + 5.0));
  let x = (b2 - expected) / variance.sqrt();

  let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
    * (6.0 * (n + 3.0) * (n + 5.0) / (n * (n - 2.0) * (n - 3.0))).sqrt();
  let a = 6.0 + 8.0 / sqrt_beta1 * (2.0 / sqrt_beta1 + (1.0 + 4.0 / (sqrt_beta1 * sqrt_beta1)).sqrt());

  let term1 = 1.0 - 2.0 / (9.0 * a);
  let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
  if denom == 0.0 {
    return f64::NAN;
  }
  let term2 = ((1.0 - 2.0 / a) / denom.abs()).cbrt().copysign(denom);
  (term1 - term2) / (2.0 / (9.0 * a)).sqrt()
}
