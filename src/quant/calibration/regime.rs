//! # Regime detection
//!
//! $$
//! \ell_t=\mathbb 1\{r_t\le c\},\qquad \hat P_{ij}=\frac{\#\{t:\ell_{t-1}=i,\ \ell_t=j\}}{\#\{t:\ell_{t-1}=i\}}
//! $$
//!
//! Bull/bear labelling of a return series, per-regime GBM estimates and the
//! empirical transition matrix.

use tracing::warn;

use super::diffusion::estimate_diffusion;
use crate::config::RegimeSplit;
use crate::error::CalibrationError;
use crate::stats::quantile::quantile_sorted;
use crate::stats::ReturnSeries;
use crate::stochastic::model::stationary_distribution;
use crate::stochastic::model::DiffusionParams;
use crate::stochastic::model::BEAR;
use crate::stochastic::model::BULL;

/// Regime-specific diffusions, chain and the labels they were fitted on.
#[derive(Clone, Debug, PartialEq)]
pub struct RegimeEstimate {
  pub bull: DiffusionParams,
  pub bear: DiffusionParams,
  pub transition: [[f64; 2]; 2],
  pub initial: [f64; 2],
  pub labels: Vec<usize>,
  /// True when either regime had fewer than two observations and the
  /// global estimate was used for both.
  pub fallback: bool,
}

/// Label every return `BULL` or `BEAR`.
pub fn label_regimes(returns: &[f64], split: RegimeSplit) -> Vec<usize> {
  let cut = match split {
    RegimeSplit::Zero => 0.0,
    RegimeSplit::Median => {
      let mut sorted = returns.to_vec();
      sorted.sort_unstable_by(f64::total_cmp);
      quantile_sorted(&sorted, 0.5)
    }
  };

  returns
    .iter()
    .map(|&r| if r > cut { BULL } else { BEAR })
    .collect()
}

/// Row-normalised transition counts of consecutive labels. A state that is
/// never left gets the uniform row.
pub fn transition_matrix(labels: &[usize]) -> [[f64; 2]; 2] {
  let mut counts = [[0u64; 2]; 2];
  for w in labels.windows(2) {
    counts[w[0]][w[1]] += 1;
  }

  let mut p = [[0.5; 2]; 2];
  for (row, c) in p.iter_mut().zip(counts.iter()) {
    let total = c[0] + c[1];
    if total > 0 {
      row[0] = c[0] as f64 / total as f64;
      row[1] = c[1] as f64 / total as f64;
    }
  }
  p
}

pub fn estimate_regimes(
  returns: &ReturnSeries,
  split: RegimeSplit,
  periods_per_year: f64,
) -> Result<RegimeEstimate, CalibrationError> {
  let labels = label_regimes(&returns.returns, split);

  let subset = |state: usize| -> Vec<f64> {
    returns
      .returns
      .iter()
      .zip(labels.iter())
      .filter(|(_, &l)| l == state)
      .map(|(&r, _)| r)
      .collect()
  };
  let bull_returns = subset(BULL);
  let bear_returns = subset(BEAR);

  if bull_returns.len() < 2 || bear_returns.len() < 2 {
    warn!(
      bull = bull_returns.len(),
      bear = bear_returns.len(),
      "too few observations in a regime, using the global estimate for both"
    );
    let global = estimate_diffusion(returns, periods_per_year)?;
    return Ok(RegimeEstimate {
      bull: global,
      bear: global,
      transition: [[0.5; 2]; 2],
      initial: [0.5; 2],
      labels,
      fallback: true,
    });
  }

  let bull = estimate_diffusion(&ReturnSeries::from_returns(bull_returns), periods_per_year)?;
  let bear = estimate_diffusion(&ReturnSeries::from_returns(bear_returns), periods_per_year)?;
  let transition = transition_matrix(&labels);

  Ok(RegimeEstimate {
    bull,
    bear,
    transition,
    initial: stationary_distribution(&transition),
    labels,
    fallback: false,
  })
}
