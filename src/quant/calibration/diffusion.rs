//! # Diffusion MLE
//!
//! $$
//! \hat\sigma^2=\frac{D}{n}\sum_{t=1}^{n}(r_t-\bar r)^2,\qquad \hat\mu=D\,\bar r+\tfrac12\hat\sigma^2
//! $$
//!
use crate::error::CalibrationError;
use crate::stats::ReturnSeries;
use crate::stochastic::model::DiffusionParams;

/// Maximum-likelihood GBM drift and volatility from per-step log returns,
/// annualised with `periods_per_year` observations per year.
///
/// At least two returns are required; a single return has no dispersion to
/// estimate. A zero-variance series is valid and yields `sigma = 0`.
pub fn estimate_diffusion(
  returns: &ReturnSeries,
  periods_per_year: f64,
) -> Result<DiffusionParams, CalibrationError> {
  if returns.len() < 2 {
    return Err(CalibrationError::insufficient(
      "diffusion estimate",
      2,
      returns.len(),
    ));
  }
  if !returns.mean.is_finite() {
    return Err(CalibrationError::NumericalInstability(format!(
      "mean log return is not finite ({})",
      returns.mean
    )));
  }
  if !(returns.variance.is_finite() && returns.variance >= 0.0) {
    return Err(CalibrationError::NumericalInstability(format!(
      "log return variance is {}",
      returns.variance
    )));
  }

  let variance = periods_per_year * returns.variance;
  let mu = periods_per_year * returns.mean + 0.5 * variance;
  let sigma = variance.sqrt();

  if !(mu.is_finite() && sigma.is_finite()) {
    return Err(CalibrationError::NumericalInstability(format!(
      "annualised estimates overflow: mu = {mu}, sigma = {sigma}"
    )));
  }

  Ok(DiffusionParams::new(mu, sigma))
}
