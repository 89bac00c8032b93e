//! # Regime switching
//!
//! $$
//! S_{t+\Delta t}=S_t\exp\!\Big(\big(\mu_{R_{t+1}}-\tfrac12\sigma_{R_{t+1}}^2\big)\Delta t+\sigma_{R_{t+1}}\sqrt{\Delta t}\,Z\Big)\prod_{k=1}^{N_{\Delta t}}e^{Y_k}
//! $$
//!
//! Each step first moves the chain, then applies the diffusion of the new
//! regime, then the shared jump component.

use ndarray::ArrayViewMut1;

use super::markov::TwoStateChain;
use crate::error::SimulationError;
use crate::rng::PathStreams;
use crate::stochastic::diffusion::LognormalStep;
use crate::stochastic::model::ModelType;
use crate::stochastic::model::RegimeParams;
use crate::stochastic::model::BEAR;
use crate::stochastic::model::BULL;
use crate::stochastic::process::CompoundPoisson;
use crate::traits::PathCounters;
use crate::traits::PathGenerator;

/// Markov regime-switching jump-diffusion path generator.
#[derive(Clone, Debug)]
pub struct RegimeSwitching {
  steps: [LognormalStep; 2],
  chain: TwoStateChain,
  jumps: CompoundPoisson,
}

impl RegimeSwitching {
  pub fn new(params: &RegimeParams, dt: f64) -> Result<Self, SimulationError> {
    Ok(Self {
      steps: [
        LognormalStep::new(&params.bull, dt),
        LognormalStep::new(&params.bear, dt),
      ],
      chain: TwoStateChain::new(params.transition, params.initial),
      jumps: CompoundPoisson::new(&params.jump, dt)?,
    })
  }
}

impl PathGenerator for RegimeSwitching {
  fn model_type(&self) -> ModelType {
    ModelType::RegimeCombined
  }

  fn has_regimes(&self) -> bool {
    true
  }

  fn fill_path(
    &self,
    mut path: ArrayViewMut1<f64>,
    streams: &mut PathStreams,
    mut regimes: Option<ArrayViewMut1<u8>>,
  ) -> PathCounters {
    let mut counters = PathCounters::default();
    let mut s = path[0];

    let mut regime = self.chain.initial_state(&mut streams.regime);
    counters.occupancy[regime] += 1;
    if let Some(r) = regimes.as_mut() {
      r[0] = regime as u8;
    }

    for t in 1..path.len() {
      regime = self.chain.next_state(regime, &mut streams.regime);
      counters.occupancy[regime] += 1;
      if let Some(r) = regimes.as_mut() {
        r[t] = regime as u8;
      }

      s *= self.steps[regime].sample(&mut streams.diffusion);
      let draw = self.jumps.sample(&mut streams.jump);
      if draw.count > 0 {
        s *= draw.log_sum.exp();
        counters.jump_events += draw.count;
      }
      s = counters.clamp(s);
      path[t] = s;
    }

    debug_assert!(counters.occupancy[BULL] + counters.occupancy[BEAR] == path.len() as u64);
    counters
  }
}
