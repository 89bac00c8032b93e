//! # Merton
//!
//! $$
//! S_{t+\Delta t}=S_t\exp\!\Big(\big(\mu-\tfrac12\sigma^2\big)\Delta t+\sigma\sqrt{\Delta t}\,Z\Big)\prod_{k=1}^{N_{\Delta t}}e^{Y_k}
//! $$
//!
use ndarray::ArrayViewMut1;

use crate::error::SimulationError;
use crate::rng::PathStreams;
use crate::stochastic::diffusion::LognormalStep;
use crate::stochastic::model::DiffusionParams;
use crate::stochastic::model::JumpParams;
use crate::stochastic::model::ModelType;
use crate::stochastic::process::CompoundPoisson;
use crate::traits::PathCounters;
use crate::traits::PathGenerator;

/// Merton jump-diffusion path generator.
#[derive(Clone, Debug)]
pub struct Merton {
  step: LognormalStep,
  jumps: CompoundPoisson,
}

impl Merton {
  pub fn new(
    diffusion: &DiffusionParams,
    jump: &JumpParams,
    dt: f64,
  ) -> Result<Self, SimulationError> {
    Ok(Self {
      step: LognormalStep::new(diffusion, dt),
      jumps: CompoundPoisson::new(jump, dt)?,
    })
  }
}

impl PathGenerator for Merton {
  fn model_type(&self) -> ModelType {
    ModelType::Jump
  }

  fn fill_path(
    &self,
    mut path: ArrayViewMut1<f64>,
    streams: &mut PathStreams,
    _regimes: Option<ArrayViewMut1<u8>>,
  ) -> PathCounters {
    let mut counters = PathCounters::default();
    let mut s = path[0];

    for t in 1..path.len() {
      s *= self.step.sample(&mut streams.diffusion);
      let draw = self.jumps.sample(&mut streams.jump);
      if draw.count > 0 {
        s *= draw.log_sum.exp();
        counters.jump_events += draw.count;
      }
      s = counters.clamp(s);
      path[t] = s;
    }

    counters
  }
}

#[cfg(test)]
mod tests {
  use ndarray::Array1;
  use rand_distr::Distribution;
  use rand_distr::Poisson;

  use super::*;
  use crate::rng::SeededRng;
  use crate::rng::Stream;
  use crate::stochastic::diffusion::Gbm;

  #[test]
  fn no_intensity_matches_gbm_bit_for_bit() {
    let d = DiffusionParams::new(0.07, 0.25);
    let dt = 1.0 / 252.0;
    let merton = Merton::new(&d, &JumpParams::new(0.0, -0.2, 0.1), dt).unwrap();
    let gbm = Gbm::new(&d, dt);

    let mut a = Array1::zeros(64);
    let mut b = Array1::zeros(64);
    a[0] = 100.0;
    b[0] = 100.0;
    let ca = merton.fill_path(a.view_mut(), &mut PathStreams::new(5, 2), None);
    gbm.fill_path(b.view_mut(), &mut PathStreams::new(5, 2), None);

    assert_eq!(a, b);
    assert_eq!(ca.jump_events, 0);
  }

  #[test]
  fn pure_jumps_follow_the_poisson_counts() {
    let dt = 1.0 / 252.0;
    let merton = Merton::new(
      &DiffusionParams::new(0.0, 0.0),
      &JumpParams::new(1000.0, 1.0, 0.0),
      dt,
    )
    .unwrap();
    let mut path = Array1::zeros(21);
    path[0] = 1.0;
    let counters = merton.fill_path(path.view_mut(), &mut PathStreams::new(17, 4), None);

    let mut rng = SeededRng::for_stream(17, 4, Stream::Jump);
    let poisson = Poisson::new(1000.0 * dt).unwrap();
    let mut total = 0u64;
    for t in 1..21 {
      let n: f64 = poisson.sample(&mut rng);
      // size draws are consumed even with zero sigma
      for _ in 0..n as u64 {
        let _: f64 = rand_distr::StandardNormal.sample(&mut rng);
      }
      total += n as u64;
      let ratio = path[t] / path[t - 1];
      assert!((ratio - n.exp()).abs() < 1e-9 * n.exp());
    }
    assert_eq!(counters.jump_events, total);
    assert!(total > 0);
  }
}
