//! # Calibration
//!
//! $$
//! \{(t_j,P_j)\}_{j=0}^{n}\ \mapsto\ \hat\theta
//! $$
//!
//! Historical price series to model parameters. Drift and volatility are
//! estimated on the full return series; jump detection does not filter
//! them.

use tracing::debug;
use tracing::info;

use crate::config::CalibrationConfig;
use crate::error::CalibrationError;
use crate::stats::HistoricalSeries;
use crate::stats::ReturnSeries;
use crate::stochastic::model::JumpParams;
use crate::stochastic::model::ModelParameters;
use crate::stochastic::model::ModelType;
use crate::stochastic::model::RegimeParams;

pub mod diffusion;
pub mod jump;
pub mod regime;

pub use diffusion::estimate_diffusion;
pub use jump::detect_jumps;
pub use jump::JumpEstimate;
pub use regime::estimate_regimes;
pub use regime::RegimeEstimate;

/// Calibrate `model_type` to a historical price series.
#[tracing::instrument(skip(series, config), fields(observations = series.len()))]
pub fn calibrate(
  series: &HistoricalSeries,
  model_type: ModelType,
  config: &CalibrationConfig,
) -> Result<ModelParameters, CalibrationError> {
  validate_config(config)?;
  let returns = series.log_returns()?;
  calibrate_returns(&returns, model_type, config)
}

/// Calibrate `model_type` to an already computed log-return series.
pub fn calibrate_returns(
  returns: &ReturnSeries,
  model_type: ModelType,
  config: &CalibrationConfig,
) -> Result<ModelParameters, CalibrationError> {
  let periods = config.trading_days_per_year;
  let diffusion = estimate_diffusion(returns, periods)?;

  let jump = |returns: &ReturnSeries| -> JumpParams {
    let estimate = detect_jumps(returns, config.jump_threshold_k, periods);
    debug!(
      jumps = estimate.flagged.len(),
      intensity = estimate.params.intensity,
      "detected jumps"
    );
    estimate.params
  };

  let params = match model_type {
    ModelType::Diffusion => ModelParameters::Diffusion(diffusion),
    ModelType::Jump => ModelParameters::Jump {
      diffusion,
      jump: jump(returns),
    },
    ModelType::RegimeCombined => {
      let regimes = estimate_regimes(returns, config.regime_split, periods)?;
      ModelParameters::RegimeCombined(RegimeParams::new(
        regimes.bull,
        regimes.bear,
        regimes.transition,
        regimes.initial,
        jump(returns),
      ))
    }
  };

  info!(model = %model_type, ?params, "calibrated");
  Ok(params)
}

fn validate_config(config: &CalibrationConfig) -> Result<(), CalibrationError> {
  let ok = |x: f64| x.is_finite() && x > 0.0;
  if !ok(config.jump_threshold_k) || !ok(config.trading_days_per_year) {
    return Err(CalibrationError::NumericalInstability(format!(
      "calibration needs positive finite k and trading days, got {} and {}",
      config.jump_threshold_k, config.trading_days_per_year
    )));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use rand::SeedableRng;
  use rand_distr::Distribution;
  use rand_distr::StandardNormal;
  use tracing_test::traced_test;

  use super::*;
  use crate::rng::SeededRng;

  fn gbm_prices(mu: f64, sigma: f64, n: usize, seed: u64) -> Vec<f64> {
    let dt = 1.0 / 252.0;
    let mut rng = SeededRng::seed_from_u64(seed);
    let mut p = vec![100.0];
    for _ in 0..n {
      let z: f64 = StandardNormal.sample(&mut rng);
      let last = p[p.len() - 1];
      p.push(last * ((mu - 0.5 * sigma * sigma) * dt + sigma * dt.sqrt() * z).exp());
    }
    p
  }

  #[test]
  fn recovers_gbm_volatility() {
    let series = HistoricalSeries::from_prices(&gbm_prices(0.1, 0.25, 5000, 1)).unwrap();
    let params = calibrate(&series, ModelType::Diffusion, &CalibrationConfig::default()).unwrap();

    let ModelParameters::Diffusion(d) = params else {
      panic!("expected diffusion parameters");
    };
    assert!((d.sigma - 0.25).abs() < 0.01, "sigma {}", d.sigma);
  }

  #[test]
  fn every_model_produces_valid_parameters() {
    let series = HistoricalSeries::from_prices(&gbm_prices(0.05, 0.3, 600, 2)).unwrap();
    for model in ModelType::ALL {
      let params = calibrate(&series, model, &CalibrationConfig::default()).unwrap();
      assert_eq!(params.model_type(), model);
      params.validate().unwrap();
    }
  }

  #[test]
  fn jump_and_regime_share_the_diffusion_estimate_source() {
    let series = HistoricalSeries::from_prices(&gbm_prices(0.05, 0.3, 300, 3)).unwrap();
    let config = CalibrationConfig::default();

    let ModelParameters::Diffusion(d) = calibrate(&series, ModelType::Diffusion, &config).unwrap()
    else {
      panic!("expected diffusion parameters");
    };
    let ModelParameters::Jump { diffusion, .. } =
      calibrate(&series, ModelType::Jump, &config).unwrap()
    else {
      panic!("expected jump parameters");
    };
    assert_eq!(d, diffusion);
  }

  #[test]
  fn single_price_is_insufficient() {
    let series = HistoricalSeries::from_prices(&[100.0]).unwrap();
    let err = calibrate(&series, ModelType::Jump, &CalibrationConfig::default()).unwrap_err();
    assert!(matches!(err, CalibrationError::InsufficientData { .. }));
  }

  #[test]
  fn two_prices_are_insufficient_for_every_model() {
    let series = HistoricalSeries::from_prices(&[100.0, 101.0]).unwrap();
    for model in ModelType::ALL {
      let err = calibrate(&series, model, &CalibrationConfig::default()).unwrap_err();
      assert!(
        matches!(err, CalibrationError::InsufficientData { required: 2, actual: 1, .. }),
        "{model}: {err:?}"
      );
    }
  }

  #[traced_test]
  #[test]
  fn logs_the_calibrated_model() {
    let series = HistoricalSeries::from_prices(&[100.0, 101.0, 99.0, 102.0]).unwrap();
    calibrate(&series, ModelType::Diffusion, &CalibrationConfig::default()).unwrap();
    assert!(logs_contain("calibrated"));
  }
}
