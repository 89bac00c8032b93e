//! # Earnings shocks
//!
//! $$
//! S_t\ \leftarrow\ S_t\prod_{k\in\mathcal K,\ k\le t}(1+X_k),\qquad X_k\sim\mathcal N(m,s^2)
//! $$
//!
//! Discrete multiplicative price shocks at scheduled steps, laid over a
//! generated path. A shock at step `k` moves the price at `k` and every
//! later step by the same factor.

use impl_new_derive::ImplNew;
use ndarray::ArrayViewMut1;
use rand::Rng;
use rand_distr::Distribution;
use rand_distr::Normal;
use serde::Deserialize;
use serde::Serialize;

use crate::error::SimulationError;
use crate::traits::PathCounters;

/// Default standard deviation of a relative earnings move.
pub const DEFAULT_SHOCK_STD: f64 = 0.05;

/// Earnings dates given as step indices, with the distribution of the
/// relative move on each of them.
#[derive(ImplNew, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EarningsShocks {
  /// Steps in `1..=steps` that carry a shock. Duplicates shock once.
  pub steps: Vec<usize>,
  #[serde(default)]
  pub shock_mean: f64,
  #[serde(default = "default_shock_std")]
  pub shock_std: f64,
}

fn default_shock_std() -> f64 {
  DEFAULT_SHOCK_STD
}

impl EarningsShocks {
  /// Check the overlay against a path of `steps` steps and build the
  /// per-step schedule.
  pub fn schedule(&self, steps: usize) -> Result<ShockSchedule, SimulationError> {
    if !(self.shock_mean.is_finite() && self.shock_std.is_finite()) {
      return Err(SimulationError::NumericalInstability(format!(
        "earnings shock mean {} and std {} must be finite",
        self.shock_mean, self.shock_std
      )));
    }
    let sizes = Normal::new(self.shock_mean, self.shock_std).map_err(|err| {
      SimulationError::InvalidRequest(format!("earnings shock std {}: {err}", self.shock_std))
    })?;

    let mut on_step = vec![false; steps + 1];
    for &k in &self.steps {
      if k == 0 || k > steps {
        return Err(SimulationError::InvalidRequest(format!(
          "earnings shock step {k} outside 1..={steps}"
        )));
      }
      on_step[k] = true;
    }

    Ok(ShockSchedule { on_step, sizes })
  }
}

/// Validated overlay for a fixed path length.
#[derive(Clone, Debug)]
pub struct ShockSchedule {
  on_step: Vec<bool>,
  sizes: Normal<f64>,
}

impl ShockSchedule {
  pub fn is_empty(&self) -> bool {
    !self.on_step.contains(&true)
  }

  /// Shock `path` in place, drawing one size per scheduled step. Returns the
  /// number of shocks and the clamped prices.
  pub fn apply<R: Rng + ?Sized>(&self, mut path: ArrayViewMut1<f64>, rng: &mut R) -> PathCounters {
    let mut counters = PathCounters::default();
    let mut factor = 1.0;
    let mut shocked = false;

    for (t, price) in path.iter_mut().enumerate().skip(1) {
      if self.on_step.get(t).copied().unwrap_or(false) {
        factor *= 1.0 + self.sizes.sample(rng);
        counters.shock_events += 1;
        shocked = true;
      }
      if shocked {
        *price = counters.clamp(*price * factor);
      }
    }

    counters
  }
}

#[cfg(test)]
mod tests {
  use ndarray::Array1;
  use rand::SeedableRng;

  use super::*;
  use crate::rng::SeededRng;

  #[test]
  fn deterministic_shock_scales_the_suffix() {
    let schedule = EarningsShocks::new(vec![3], 0.1, 0.0).schedule(5).unwrap();
    let mut path = Array1::from(vec![100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
    let counters = schedule.apply(path.view_mut(), &mut SeededRng::seed_from_u64(1));

    assert_eq!(counters.shock_events, 1);
    assert_eq!(&path.to_vec()[..3], &[100.0, 101.0, 102.0]);
    assert_eq!(path[3], 103.0 * 1.1);
    assert_eq!(path[5], 105.0 * 1.1);
  }

  #[test]
  fn shocks_compound_and_duplicates_count_once() {
    let schedule = EarningsShocks::new(vec![1, 2, 2], -0.5, 0.0)
      .schedule(3)
      .unwrap();
    let mut path = Array1::from_elem(4, 8.0);
    let counters = schedule.apply(path.view_mut(), &mut SeededRng::seed_from_u64(2));

    assert_eq!(counters.shock_events, 2);
    assert_eq!(path.to_vec(), vec![8.0, 4.0, 2.0, 2.0]);
  }

  #[test]
  fn wipeout_is_clamped() {
    let schedule = EarningsShocks::new(vec![1], -1.0, 0.0).schedule(2).unwrap();
    let mut path = Array1::from_elem(3, 10.0);
    let counters = schedule.apply(path.view_mut(), &mut SeededRng::seed_from_u64(3));

    assert_eq!(counters.clamped_steps, 2);
    assert!(path.iter().skip(1).all(|&p| p == f64::MIN_POSITIVE));
  }

  #[test]
  fn invalid_overlays_are_rejected() {
    for steps in [vec![0], vec![6]] {
      assert!(matches!(
        EarningsShocks::new(steps, 0.0, 0.05).schedule(5),
        Err(SimulationError::InvalidRequest(_))
      ));
    }
    assert!(matches!(
      EarningsShocks::new(vec![1], 0.0, -0.1).schedule(5),
      Err(SimulationError::InvalidRequest(_))
    ));
    assert!(matches!(
      EarningsShocks::new(vec![1], f64::NAN, 0.05).schedule(5),
      Err(SimulationError::NumericalInstability(_))
    ));
  }

  #[test]
  fn missing_moments_take_defaults() {
    let shocks: EarningsShocks = serde_json::from_str(r#"{"steps": [21, 84]}"#).unwrap();
    assert_eq!(shocks, EarningsShocks::new(vec![21, 84], 0.0, DEFAULT_SHOCK_STD));
  }
}
