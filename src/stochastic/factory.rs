//! # Factory
//!
//! $$
//! (\text{model},\theta,\Delta t)\mapsto\mathcal G_\theta
//! $$
//!
use ndarray::ArrayViewMut1;

use crate::error::SimulationError;
use crate::rng::PathStreams;
use crate::stochastic::diffusion::Gbm;
use crate::stochastic::jump::Merton;
use crate::stochastic::model::ModelParameters;
use crate::stochastic::model::ModelType;
use crate::stochastic::regime::RegimeSwitching;
use crate::traits::PathCounters;
use crate::traits::PathGenerator;

/// Closed set of generators, one per [`ModelType`].
#[derive(Clone, Debug)]
pub enum Generator {
  Diffusion(Gbm),
  Jump(Merton),
  RegimeCombined(RegimeSwitching),
}

impl Generator {
  /// Build the generator for `model_type`. The parameter variant has to
  /// belong to the same model.
  pub fn from_parameters(
    model_type: ModelType,
    params: &ModelParameters,
    dt: f64,
  ) -> Result<Self, SimulationError> {
    match (model_type, params) {
      (ModelType::Diffusion, ModelParameters::Diffusion(d)) => Ok(Self::Diffusion(Gbm::new(d, dt))),
      (ModelType::Jump, ModelParameters::Jump { diffusion, jump }) => {
        Ok(Self::Jump(Merton::new(diffusion, jump, dt)?))
      }
      (ModelType::RegimeCombined, ModelParameters::RegimeCombined(r)) => {
        Ok(Self::RegimeCombined(RegimeSwitching::new(r, dt)?))
      }
      (requested, params) => Err(SimulationError::InvalidRequest(format!(
        "model type {requested} does not match {} parameters",
        params.model_type()
      ))),
    }
  }
}

impl PathGenerator for Generator {
  fn model_type(&self) -> ModelType {
    match self {
      Generator::Diffusion(g) => g.model_type(),
      Generator::Jump(g) => g.model_type(),
      Generator::RegimeCombined(g) => g.model_type(),
    }
  }

  fn fill_path(
    &self,
    path: ArrayViewMut1<f64>,
    streams: &mut PathStreams,
    regimes: Option<ArrayViewMut1<u8>>,
  ) -> PathCounters {
    match self {
      Generator::Diffusion(g) => g.fill_path(path, streams, regimes),
      Generator::Jump(g) => g.fill_path(path, streams, regimes),
      Generator::RegimeCombined(g) => g.fill_path(path, streams, regimes),
    }
  }

  fn has_regimes(&self) -> bool {
    match self {
      Generator::Diffusion(g) => g.has_regimes(),
      Generator::Jump(g) => g.has_regimes(),
      Generator::RegimeCombined(g) => g.has_regimes(),
    }
  }
}
