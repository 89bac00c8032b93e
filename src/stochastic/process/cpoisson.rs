//! # Compound Poisson
//!
//! $$
//! J_{\Delta t}=\sum_{k=1}^{N_{\Delta t}}Y_k,\quad N_{\Delta t}\sim\mathrm{Poi}(\lambda\Delta t),\quad Y_k\sim\mathcal N(m,s^2)
//! $$
//!
use rand::Rng;
use rand_distr::Distribution;
use rand_distr::Poisson;
use rand_distr::StandardNormal;

use crate::error::SimulationError;
use crate::stochastic::model::JumpParams;

/// Outcome of one step of the jump process.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JumpDraw {
  pub count: u64,
  /// Sum of the log jump sizes, `0.0` when `count == 0`.
  pub log_sum: f64,
}

/// Per-step compound Poisson sampler with lognormal jump sizes.
#[derive(Clone, Debug)]
pub struct CompoundPoisson {
  /// `None` when `lambda * dt == 0`: no draws are taken at all.
  counts: Option<Poisson<f64>>,
  mean_log: f64,
  sigma_log: f64,
}

impl CompoundPoisson {
  pub fn new(params: &JumpParams, dt: f64) -> Result<Self, SimulationError> {
    let lambda_dt = params.intensity * dt;
    let counts = if lambda_dt > 0.0 {
      Some(Poisson::new(lambda_dt).map_err(|err| {
        SimulationError::InvalidRequest(format!("jump intensity {lambda_dt} per step: {err}"))
      })?)
    } else {
      None
    };

    Ok(Self {
      counts,
      mean_log: params.mean_log,
      sigma_log: params.sigma_log,
    })
  }

  pub fn is_active(&self) -> bool {
    self.counts.is_some()
  }

  /// Draw the number of jumps in one step and the sum of their log sizes.
  #[inline]
  pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> JumpDraw {
    let Some(counts) = &self.counts else {
      return JumpDraw::default();
    };

    let count = counts.sample(rng) as u64;
    let mut log_sum = 0.0;
    for _ in 0..count {
      let z: f64 = StandardNormal.sample(rng);
      log_sum += self.mean_log + self.sigma_log * z;
    }

    JumpDraw { count, log_sum }
  }
}

#[cfg(test)]
mod tests {
  use rand::SeedableRng;

  use super::*;
  use crate::rng::SeededRng;

  #[test]
  fn zero_intensity_draws_nothing() {
    let jumps = CompoundPoisson::new(&JumpParams::new(0.0, 0.5, 0.1), 1.0 / 252.0).unwrap();
    let mut rng = SeededRng::seed_from_u64(3);
    let mut untouched = rng.clone();

    assert!(!jumps.is_active());
    assert_eq!(jumps.sample(&mut rng), JumpDraw::default());
    assert_eq!(rng.gen::<u64>(), untouched.gen::<u64>());
  }

  #[test]
  fn deterministic_sizes_sum_to_count_times_mean() {
    let jumps = CompoundPoisson::new(&JumpParams::new(500.0, 0.25, 0.0), 0.01).unwrap();
    let mut rng = SeededRng::seed_from_u64(11);

    let mut total = 0;
    for _ in 0..200 {
      let draw = jumps.sample(&mut rng);
      assert!((draw.log_sum - 0.25 * draw.count as f64).abs() < 1e-12);
      total += draw.count;
    }
    // lambda dt = 5 per step
    let mean = total as f64 / 200.0;
    assert!((mean - 5.0).abs() < 1.0, "mean count {mean}");
  }
}
