//! # Traits
//!
//! $$
//! \mathcal{G}_\theta:\ (S_0,\ \text{streams}_i)\ \mapsto\ (S_{i,1},\dots,S_{i,N})
//! $$
//!
use ndarray::ArrayViewMut1;

use crate::rng::PathStreams;
use crate::stochastic::model::ModelType;

/// Counters of a single generated path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PathCounters {
  pub clamped_steps: u64,
  pub jump_events: u64,
  /// Earnings shocks applied by the overlay.
  pub shock_events: u64,
  /// Steps `0..=N` spent in `[bull, bear]`.
  pub occupancy: [u64; 2],
}

impl PathCounters {
  /// Replace a non-finite or underflowed price by the smallest positive
  /// `f64` and count it.
  #[inline]
  pub fn clamp(&mut self, price: f64) -> f64 {
    if price.is_finite() && price > 0.0 {
      price
    } else {
      self.clamped_steps += 1;
      f64::MIN_POSITIVE
    }
  }
}

/// A price model that fills one path at a time.
///
/// Implementors hold everything derived from the parameters and the step
/// size. All randomness comes from the supplied [`PathStreams`], which keeps
/// a path's values independent of how paths are distributed over workers.
pub trait PathGenerator: Send + Sync {
  fn model_type(&self) -> ModelType;

  /// Fill `path[1..]` from `path[0]`. When `regimes` is given it receives the
  /// regime index of every step, including step 0.
  fn fill_path(
    &self,
    path: ArrayViewMut1<f64>,
    streams: &mut PathStreams,
    regimes: Option<ArrayViewMut1<u8>>,
  ) -> PathCounters;

  fn has_regimes(&self) -> bool {
    false
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clamp_counts_bad_prices_only() {
    let mut c = PathCounters::default();
    assert_eq!(c.clamp(12.5), 12.5);
    assert_eq!(c.clamp(0.0), f64::MIN_POSITIVE);
    assert_eq!(c.clamp(f64::INFINITY), f64::MIN_POSITIVE);
    assert_eq!(c.clamp(f64::NAN), f64::MIN_POSITIVE);
    assert_eq!(c.clamped_steps, 3);
  }
}
