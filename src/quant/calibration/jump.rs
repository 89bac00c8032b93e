//! # Jump detection
//!
//! $$
//! \mathcal J=\{t:\ |r_t-\bar r|>k\,\hat\sigma\sqrt{\Delta t}\},\qquad \hat\lambda=\frac{|\mathcal J|}{n\,\Delta t}
//! $$
//!
//! Threshold detection of jumps in a return series. Jump sizes are the
//! flagged log returns, `ln(1 + R_t)` of the simple return `R_t`.

use statrs::statistics::Statistics;

use crate::stats::ReturnSeries;
use crate::stochastic::model::JumpParams;

/// Jump parameters and the indices of the flagged returns.
#[derive(Clone, Debug, PartialEq)]
pub struct JumpEstimate {
  pub params: JumpParams,
  pub flagged: Vec<usize>,
}

/// Flag returns deviating from the mean by more than `k` per-step standard
/// deviations and fit a compound Poisson lognormal component to them.
///
/// `sigma_hat * sqrt(dt)` with an annualised `sigma_hat` is the per-step
/// standard deviation itself, which is what the threshold uses.
pub fn detect_jumps(returns: &ReturnSeries, k: f64, periods_per_year: f64) -> JumpEstimate {
  let threshold = k * returns.std_dev();
  let flagged: Vec<usize> = if threshold > 0.0 {
    returns
      .returns
      .iter()
      .enumerate()
      .filter(|(_, r)| (**r - returns.mean).abs() > threshold)
      .map(|(i, _)| i)
      .collect()
  } else {
    Vec::new()
  };

  if flagged.is_empty() || returns.is_empty() {
    return JumpEstimate {
      params: JumpParams::none(),
      flagged,
    };
  }

  let sizes: Vec<f64> = flagged.iter().map(|&i| returns.returns[i]).collect();
  let years = returns.len() as f64 / periods_per_year;

  JumpEstimate {
    params: JumpParams::new(
      flagged.len() as f64 / years,
      sizes.iter().mean(),
      sizes.iter().population_std_dev(),
    ),
    flagged,
  }
}
