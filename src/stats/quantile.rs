//! # Quantile
//!
//! $$
//! h=(n-1)q,\quad Q(q)=x_{(\lfloor h\rfloor)}+(h-\lfloor h\rfloor)\,(x_{(\lceil h\rceil)}-x_{(\lfloor h\rfloor)})
//! $$
//!
//! Empirical quantiles by linear interpolation between order statistics
//! (zero-based order statistics `x_(0) <= ... <= x_(n-1)`).

use rayon::prelude::*;

/// Sorted copy of a finite sample, ready for repeated quantile queries.
#[derive(Clone, Debug)]
pub struct SortedSample {
  values: Vec<f64>,
}

impl SortedSample {
  pub fn new(mut values: Vec<f64>) -> Self {
    values.par_sort_unstable_by(f64::total_cmp);
    Self { values }
  }

  pub fn as_slice(&self) -> &[f64] {
    &self.values
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn min(&self) -> f64 {
    self.values.first().copied().unwrap_or(f64::NAN)
  }

  pub fn max(&self) -> f64 {
    self.values.last().copied().unwrap_or(f64::NAN)
  }

  /// `q` is clamped to `[0, 1]`; NaN for an empty sample.
  pub fn quantile(&self, q: f64) -> f64 {
    quantile_sorted(&self.values, q)
  }

  pub fn median(&self) -> f64 {
    self.quantile(0.5)
  }

  /// Values at or below `threshold`, i.e. the lower tail.
  pub fn tail_at_or_below(&self, threshold: f64) -> &[f64] {
    let end = self.values.partition_point(|&x| x <= threshold);
    &self.values[..end]
  }
}

/// Linear-interpolation quantile of an ascending slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
  let n = sorted.len();
  if n == 0 {
    return f64::NAN;
  }

  let h = (n - 1) as f64 * q.clamp(0.0, 1.0);
  let lo = h.floor() as usize;
  let hi = h.ceil() as usize;
  let lower = sorted[lo];
  if hi == lo {
    return lower;
  }
  lower + (h - lo as f64) * (sorted[hi] - lower)
}
