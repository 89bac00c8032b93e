//! # GBM
//!
//! $$
//! S_{t+\Delta t}=S_t\exp\!\Big(\big(\mu-\tfrac12\sigma^2\big)\Delta t+\sigma\sqrt{\Delta t}\,Z\Big),\quad Z\sim\mathcal N(0,1)
//! $$
//!
use ndarray::ArrayViewMut1;
use rand::Rng;
use rand_distr::Distribution;
use rand_distr::StandardNormal;

use crate::rng::PathStreams;
use crate::stochastic::model::DiffusionParams;
use crate::stochastic::model::ModelType;
use crate::traits::PathCounters;
use crate::traits::PathGenerator;

/// Exact lognormal step of a GBM, precomputed for a fixed `dt`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LognormalStep {
  drift_dt: f64,
  vol_sdt: f64,
}

impl LognormalStep {
  pub fn new(params: &DiffusionParams, dt: f64) -> Self {
    Self {
      drift_dt: (params.mu - 0.5 * params.sigma * params.sigma) * dt,
      vol_sdt: params.sigma * dt.sqrt(),
    }
  }

  /// Growth factor for the standard normal `z`.
  #[inline(always)]
  pub fn factor(&self, z: f64) -> f64 {
    (self.drift_dt + self.vol_sdt * z).exp()
  }

  /// Draw one standard normal from `rng` and return the growth factor.
  #[inline]
  pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
    let z: f64 = StandardNormal.sample(rng);
    self.factor(z)
  }
}

/// Geometric Brownian motion path generator.
#[derive(Clone, Debug)]
pub struct Gbm {
  step: LognormalStep,
}

impl Gbm {
  pub fn new(params: &DiffusionParams, dt: f64) -> Self {
    Self {
      step: LognormalStep::new(params, dt),
    }
  }
}

impl PathGenerator for Gbm {
  fn model_type(&self) -> ModelType {
    ModelType::Diffusion
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
      s = counters.clamp(s * self.step.sample(&mut streams.diffusion));
      path[t] = s;
    }

    counters
  }
}

#[cfg(test)]
mod tests {
  use ndarray::Array1;

  use super::*;
  use crate::rng::SeededRng;
  use crate::rng::Stream;

  #[test]
  fn zero_volatility_is_deterministic_growth() {
    let dt = 1.0 / 252.0;
    let gbm = Gbm::new(&DiffusionParams::new(0.05, 0.0), dt);
    let mut path = Array1::zeros(11);
    path[0] = 100.0;

    gbm.fill_path(path.view_mut(), &mut PathStreams::new(7, 0), None);

    for t in 0..=10 {
      let expected = 100.0 * (0.05 * dt * t as f64).exp();
      assert!((path[t] - expected).abs() < 1e-10);
    }
  }

  #[test]
  fn flat_parameters_keep_the_price_constant() {
    let gbm = Gbm::new(&DiffusionParams::new(0.0, 0.0), 1.0 / 252.0);
    let mut path = Array1::zeros(6);
    path[0] = 42.0;

    let counters = gbm.fill_path(path.view_mut(), &mut PathStreams::new(1, 3), None);

    assert!(path.iter().all(|&p| p == 42.0));
    assert_eq!(counters, PathCounters::default());
  }

  #[test]
  fn uses_the_diffusion_stream_only() {
    let params = DiffusionParams::new(0.1, 0.3);
    let dt = 0.01;
    let gbm = Gbm::new(&params, dt);
    let mut path = Array1::zeros(4);
    path[0] = 10.0;
    gbm.fill_path(path.view_mut(), &mut PathStreams::new(99, 5), None);

    let mut rng = SeededRng::for_stream(99, 5, Stream::Diffusion);
    let step = LognormalStep::new(&params, dt);
    let mut s = 10.0;
    for t in 1..4 {
      s *= step.sample(&mut rng);
      assert_eq!(path[t], s);
    }
  }

  #[test]
  fn underflow_is_clamped() {
    let gbm = Gbm::new(&DiffusionParams::new(-1e6, 0.0), 1.0);
    let mut path = Array1::zeros(3);
    path[0] = 1.0;

    let counters = gbm.fill_path(path.view_mut(), &mut PathStreams::new(0, 0), None);

    assert_eq!(path[1], f64::MIN_POSITIVE);
    assert_eq!(path[2], f64::MIN_POSITIVE);
    assert_eq!(counters.clamped_steps, 2);
  }
}
