//! # Config
//!
//! $$
//! \Delta t = 1/252,\quad k = 3,\quad r_f = 0
//! $$
//!
//! Runtime configuration for calibration, generation and analysis. Every
//! field has a default, so a JSON document only has to name what it changes.

use serde::Deserialize;
use serde::Serialize;

use crate::error::EngineError;

/// Trading days per year used to annualise daily log returns.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
/// Jump detection threshold in per-step standard deviations.
pub const JUMP_THRESHOLD_K: f64 = 3.0;
/// Tolerance for probability vectors and transition-matrix rows.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Rule used to label each historical return as bull or bear.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegimeSplit {
  /// Bull when the return is strictly above the series median.
  #[default]
  Median,
  /// Bull when the return is strictly above zero.
  Zero,
}

/// Calibrator knobs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
  /// Threshold `k` of the `|r - mean| > k sigma sqrt(dt)` jump rule.
  pub jump_threshold_k: f64,
  /// Observations per year of the historical series.
  pub trading_days_per_year: f64,
  /// Bull/bear labelling rule.
  pub regime_split: RegimeSplit,
}

impl Default for CalibrationConfig {
  fn default() -> Self {
    Self {
      jump_threshold_k: JUMP_THRESHOLD_K,
      trading_days_per_year: TRADING_DAYS_PER_YEAR,
      regime_split: RegimeSplit::Median,
    }
  }
}

/// Configuration of [`crate::engine::SimulationEngine`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  pub trading_days_per_year: f64,
  pub jump_threshold_k: f64,
  pub regime_split: RegimeSplit,
  /// Annual risk-free rate subtracted in Sharpe and Sortino ratios.
  pub risk_free_rate: f64,
  /// Step size in years used when a request does not carry one.
  pub dt: f64,
  /// Rows handled by one parallel work unit.
  pub chunk_rows: usize,
  /// Fan path generation out over rayon's pool.
  pub parallel: bool,
  /// Keep per-path regime trajectories as a diagnostic output.
  pub record_regimes: bool,
  /// Confidence levels for VaR/CVaR.
  pub var_confidences: Vec<f64>,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      trading_days_per_year: TRADING_DAYS_PER_YEAR,
      jump_threshold_k: JUMP_THRESHOLD_K,
      regime_split: RegimeSplit::Median,
      risk_free_rate: 0.0,
      dt: 1.0 / TRADING_DAYS_PER_YEAR,
      chunk_rows: 256,
      parallel: true,
      record_regimes: false,
      var_confidences: vec![0.95, 0.99],
    }
  }
}

impl EngineConfig {
  /// Parse a (possibly partial) JSON document over the defaults.
  pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
    let config: Self =
      serde_json::from_str(json).map_err(|err| EngineError::Config(err.to_string()))?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), EngineError> {
    if !(self.dt.is_finite() && self.dt > 0.0) {
      return Err(EngineError::Config(format!("dt must be > 0, got {}", self.dt)));
    }
    if !(self.jump_threshold_k.is_finite() && self.jump_threshold_k > 0.0) {
      return Err(EngineError::Config(format!(
        "jump_threshold_k must be > 0, got {}",
        self.jump_threshold_k
      )));
    }
    if !(self.trading_days_per_year.is_finite() && self.trading_days_per_year > 0.0) {
      return Err(EngineError::Config(format!(
        "trading_days_per_year must be > 0, got {}",
        self.trading_days_per_year
      )));
    }
    if self.chunk_rows == 0 {
      return Err(EngineError::Config("chunk_rows must be >= 1".into()));
    }
    if !self.risk_free_rate.is_finite() {
      return Err(EngineError::Config("risk_free_rate must be finite".into()));
    }
    if let Some(alpha) = self
      .var_confidences
      .iter()
      .find(|alpha| !(**alpha > 0.0 && **alpha < 1.0))
    {
      return Err(EngineError::Config(format!(
        "VaR confidence must lie in (0, 1), got {alpha}"
      )));
    }

    Ok(())
  }

  pub fn calibration(&self) -> CalibrationConfig {
    CalibrationConfig {
      jump_threshold_k: self.jump_threshold_k,
      trading_days_per_year: self.trading_days_per_year,
      regime_split: self.regime_split,
    }
  }
}
