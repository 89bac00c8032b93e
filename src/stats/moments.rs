//! # Moments
//!
//! $$
//! m_k=\frac1n\sum_{i=1}^n (x_i-\bar x)^k,\quad \gamma_1=\frac{m_3}{m_2^{3/2}},\quad \gamma_2=\frac{m_4}{m_2^2}-3
//! $$
//!
//! Central moments by partial reduction. Partials are built over fixed-size
//! chunks and merged in chunk order, so the parallel result does not depend
//! on the size of the thread pool.

use rayon::prelude::*;

/// Elements per partial sum.
const REDUCTION_CHUNK: usize = 4096;

/// Population central moments of a sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CentralMoments {
  pub n: usize,
  pub mean: f64,
  /// Sum of squared deviations.
  pub m2: f64,
  /// Sum of cubed deviations.
  pub m3: f64,
  /// Sum of fourth-power deviations.
  pub m4: f64,
}

#[derive(Clone, Copy, Default)]
struct PowerSums {
  m2: f64,
  m3: f64,
  m4: f64,
}

impl PowerSums {
  fn of(xs: &[f64], mean: f64) -> Self {
    let mut acc = Self::default();
    for &x in xs {
      let d = x - mean;
      let d2 = d * d;
      acc.m2 += d2;
      acc.m3 += d2 * d;
      acc.m4 += d2 * d2;
    }
    acc
  }

  fn merge(self, other: Self) -> Self {
    Self {
      m2: self.m2 + other.m2,
      m3: self.m3 + other.m3,
      m4: self.m4 + other.m4,
    }
  }
}

impl CentralMoments {
  /// Single-threaded reference.
  pub fn serial(xs: &[f64]) -> Self {
    let n = xs.len();
    if n == 0 {
      return Self::default();
    }

    let mean = xs
      .chunks(REDUCTION_CHUNK)
      .map(|c| c.iter().sum::<f64>())
      .sum::<f64>()
      / n as f64;
    let sums = xs
      .chunks(REDUCTION_CHUNK)
      .map(|c| PowerSums::of(c, mean))
      .fold(PowerSums::default(), PowerSums::merge);

    Self::from_sums(n, mean, sums)
  }

  /// Chunked parallel reduction, merged in chunk order.
  pub fn parallel(xs: &[f64]) -> Self {
    let n = xs.len();
    if n == 0 {
      return Self::default();
    }

    let partial_sums: Vec<f64> = xs
      .par_chunks(REDUCTION_CHUNK)
      .map(|c| c.iter().sum::<f64>())
      .collect();
    let mean = partial_sums.iter().sum::<f64>() / n as f64;

    let partial_powers: Vec<PowerSums> = xs
      .par_chunks(REDUCTION_CHUNK)
      .map(|c| PowerSums::of(c, mean))
      .collect();
    let sums = partial_powers
      .into_iter()
      .fold(PowerSums::default(), PowerSums::merge);

    Self::from_sums(n, mean, sums)
  }

  fn from_sums(n: usize, mean: f64, sums: PowerSums) -> Self {
    Self {
      n,
      mean,
      m2: sums.m2,
      m3: sums.m3,
      m4: sums.m4,
    }
  }

  pub fn variance(&self) -> f64 {
    if self.n == 0 {
      return f64::NAN;
    }
    self.m2 / self.n as f64
  }

  pub fn std_dev(&self) -> f64 {
    self.variance().sqrt()
  }

  /// `n - 1` variance; NaN below two observations.
  pub fn sample_variance(&self) -> f64 {
    if self.n < 2 {
      return f64::NAN;
    }
    self.m2 / (self.n - 1) as f64
  }

  /// Biased skewness; NaN when the sample has no dispersion.
  pub fn skewness(&self) -> f64 {
    let var = self.variance();
    if !(var > 0.0) {
      return f64::NAN;
    }
    (self.m3 / self.n as f64) / var.powf(1.5)
  }

  /// Biased excess kurtosis; NaN when the sample has no dispersion.
  pub fn excess_kurtosis(&self) -> f64 {
    let var = self.variance();
    if !(var > 0.0) {
      return f64::NAN;
    }
    (self.m4 / self.n as f64) / (var * var) - 3.0
  }
}
