//! # Model
//!
//! $$
//! \theta\in\{(\mu,\sigma),\ (\mu,\sigma,\lambda,\mu_J,\sigma_J),\ (\mu_{1,2},\sigma_{1,2},P,\pi_0,\lambda,\mu_J,\sigma_J)\}
//! $$
//!
//! Model tags and their parameter sets.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use impl_new_derive::ImplNew;
use serde::Deserialize;
use serde::Serialize;

use crate::config::PROBABILITY_TOLERANCE;
use crate::error::SimulationError;

/// Regime index of the bull state.
pub const BULL: usize = 0;
/// Regime index of the bear state.
pub const BEAR: usize = 1;

/// Supported price models.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
  /// Geometric Brownian motion.
  Diffusion,
  /// GBM with compound Poisson lognormal jumps (Merton).
  Jump,
  /// Two-state Markov regime switching GBM with shared jumps.
  RegimeCombined,
}

impl ModelType {
  pub const ALL: [ModelType; 3] = [Self::Diffusion, Self::Jump, Self::RegimeCombined];
}

impl Display for ModelType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ModelType::Diffusion => write!(f, "diffusion"),
      ModelType::Jump => write!(f, "jump"),
      ModelType::RegimeCombined => write!(f, "regime_combined"),
    }
  }
}

impl FromStr for ModelType {
  type Err = SimulationError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "gbm" | "diffusion" => Ok(Self::Diffusion),
      "jump" | "merton" | "jump_diffusion" => Ok(Self::Jump),
      "hybrid" | "combined" | "regime" | "regime_combined" => Ok(Self::RegimeCombined),
      other => Err(SimulationError::InvalidRequest(format!(
        "unknown model type '{other}'"
      ))),
    }
  }
}

/// Annualised drift and volatility.
#[derive(ImplNew, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiffusionParams {
  pub mu: f64,
  pub sigma: f64,
}

/// Compound Poisson lognormal jump component.
#[derive(ImplNew, Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JumpParams {
  /// Expected jumps per year.
  pub intensity: f64,
  /// Mean of the log jump size.
  pub mean_log: f64,
  /// Standard deviation of the log jump size.
  pub sigma_log: f64,
}

impl JumpParams {
  /// Jump component that never fires.
  pub fn none() -> Self {
    Self::default()
  }
}

/// Regime-specific diffusion, Markov chain and shared jumps.
#[derive(ImplNew, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegimeParams {
  pub bull: DiffusionParams,
  pub bear: DiffusionParams,
  /// Row-stochastic matrix indexed `[from][to]` with bull = 0, bear = 1.
  pub transition: [[f64; 2]; 2],
  /// Distribution of the regime at step 0.
  pub initial: [f64; 2],
  pub jump: JumpParams,
}

impl RegimeParams {
  pub fn regime(&self, index: usize) -> &DiffusionParams {
    if index == BULL {
      &self.bull
    } else {
      &self.bear
    }
  }
}

/// Stationary distribution of a two-state chain, `[0.5, 0.5]` when it is
/// not unique.
pub fn stationary_distribution(transition: &[[f64; 2]; 2]) -> [f64; 2] {
  let to_bear = transition[BULL][BEAR];
  let to_bull = transition[BEAR][BULL];
  let total = to_bear + to_bull;
  if total > 0.0 {
    [to_bull / total, to_bear / total]
  } else {
    [0.5, 0.5]
  }
}

/// Parameters of one model, tagged by variant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelParameters {
  Diffusion(DiffusionParams),
  Jump {
    diffusion: DiffusionParams,
    jump: JumpParams,
  },
  RegimeCombined(RegimeParams),
}

impl ModelParameters {
  pub fn model_type(&self) -> ModelType {
    match self {
      ModelParameters::Diffusion(_) => ModelType::Diffusion,
      ModelParameters::Jump { .. } => ModelType::Jump,
      ModelParameters::RegimeCombined(_) => ModelType::RegimeCombined,
    }
  }

  /// Non-finite fields are numerical instability; out-of-domain fields are
  /// an invalid request.
  pub fn validate(&self) -> Result<(), SimulationError> {
    match self {
      ModelParameters::Diffusion(d) => validate_diffusion(d, "diffusion"),
      ModelParameters::Jump { diffusion, jump } => {
        validate_diffusion(diffusion, "diffusion")?;
        validate_jump(jump)
      }
      ModelParameters::RegimeCombined(r) => {
        validate_diffusion(&r.bull, "bull")?;
        validate_diffusion(&r.bear, "bear")?;
        validate_jump(&r.jump)?;
        for (i, row) in r.transition.iter().enumerate() {
          validate_probabilities(row, &format!("transition row {i}"))?;
        }
        validate_probabilities(&r.initial, "initial regime distribution")
      }
    }
  }

  /// Flat `name -> value` view for persistence and templating.
  pub fn to_flat_map(&self) -> BTreeMap<String, f64> {
    let mut map = BTreeMap::new();
    let mut put = |k: &str, v: f64| {
      map.insert(k.to_string(), v);
    };

    match self {
      ModelParameters::Diffusion(d) => {
        put("mu", d.mu);
        put("sigma", d.sigma);
      }
      ModelParameters::Jump { diffusion, jump } => {
        put("mu", diffusion.mu);
        put("sigma", diffusion.sigma);
        put("jump_intensity", jump.intensity);
        put("jump_mean_log", jump.mean_log);
        put("jump_sigma_log", jump.sigma_log);
      }
      ModelParameters::RegimeCombined(r) => {
        put("mu_bull", r.bull.mu);
        put("sigma_bull", r.bull.sigma);
        put("mu_bear", r.bear.mu);
        put("sigma_bear", r.bear.sigma);
        put("p_bull_bull", r.transition[BULL][BULL]);
        put("p_bull_bear", r.transition[BULL][BEAR]);
        put("p_bear_bull", r.transition[BEAR][BULL]);
        put("p_bear_bear", r.transition[BEAR][BEAR]);
        put("initial_bull", r.initial[BULL]);
        put("initial_bear", r.initial[BEAR]);
        put("jump_intensity", r.jump.intensity);
        put("jump_mean_log", r.jump.mean_log);
        put("jump_sigma_log", r.jump.sigma_log);
      }
    }

    map
  }
}

fn non_finite(context: &str, name: &str, value: f64) -> SimulationError {
  SimulationError::NumericalInstability(format!("{context}.{name} is not finite ({value})"))
}

fn validate_diffusion(d: &DiffusionParams, context: &str) -> Result<(), SimulationError> {
  if !d.mu.is_finite() {
    return Err(non_finite(context, "mu", d.mu));
  }
  if !d.sigma.is_finite() {
    return Err(non_finite(context, "sigma", d.sigma));
  }
  if d.sigma < 0.0 {
    return Err(SimulationError::InvalidRequest(format!(
      "{context}.sigma must be >= 0, got {}",
      d.sigma
    )));
  }
  Ok(())
}

fn validate_jump(j: &JumpParams) -> Result<(), SimulationError> {
  for (name, value) in [
    ("intensity", j.intensity),
    ("mean_log", j.mean_log),
    ("sigma_log", j.sigma_log),
  ] {
    if !value.is_finite() {
      return Err(non_finite("jump", name, value));
    }
  }
  if j.intensity < 0.0 || j.sigma_log < 0.0 {
    return Err(SimulationError::InvalidRequest(format!(
      "jump intensity and sigma_log must be >= 0, got {} and {}",
      j.intensity, j.sigma_log
    )));
  }
  Ok(())
}

fn validate_probabilities(p: &[f64; 2], context: &str) -> Result<(), SimulationError> {
  if p.iter().any(|x| !x.is_finite()) {
    return Err(SimulationError::NumericalInstability(format!(
      "{context} has non-finite entries {p:?}"
    )));
  }
  if p.iter().any(|x| !(0.0..=1.0).contains(x)) {
    return Err(SimulationError::InvalidRequest(format!(
      "{context} entries must lie in [0, 1], got {p:?}"
    )));
  }
  if (p[0] + p[1] - 1.0).abs() > PROBABILITY_TOLERANCE {
    return Err(SimulationError::InvalidRequest(format!(
      "{context} must sum to 1, got {p:?}"
    )));
  }
  Ok(())
}
