//! # Drawdown
//!
//! $$
//! \mathrm{MDD}=\max_t \frac{\max_{u\le t} S_u - S_t}{\max_{u\le t} S_u}
//! $$
//!

use ndarray::ArrayView1;
use ndarray::ArrayView2;
use ndarray::Axis;
use ndarray::parallel::prelude::*;

/// Maximum drawdown of one trajectory; `[0, 1)` for strictly positive prices.
pub fn max_drawdown(path: ArrayView1<f64>) -> f64 {
  let mut running_max = f64::NEG_INFINITY;
  let mut worst = 0.0f64;

  for &p in path.iter() {
    running_max = running_max.max(p);
    if running_max > 0.0 {
      worst = worst.max((running_max - p) / running_max);
    }
  }

  worst
}

/// Per-row maximum drawdown of a path matrix, one value per path.
pub fn max_drawdowns(paths: ArrayView2<f64>) -> Vec<f64> {
  paths
    .axis_iter(Axis(0))
    .into_par_iter()
    .map(max_drawdown)
    .collect()
}
