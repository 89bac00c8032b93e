//! # Ensemble
//!
//! $$
//! \mathbf{S}\in\mathbb{R}_{>0}^{P\times(N+1)},\quad \mathbf{S}_{i,0}=S_0
//! $$
//!
//! Simulated path matrix and the diagnostics collected while generating it.

use std::io;
use std::io::BufRead;
use std::io::Write;

use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::ArrayView2;
use ndarray::Axis;
use ndarray_stats::QuantileExt;
use serde::Deserialize;
use serde::Serialize;

/// Dense `[paths][steps + 1]` price matrix. Read-only after generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathEnsemble {
  prices: Array2<f64>,
}

impl PathEnsemble {
  /// Wrap an existing matrix. Shape and finiteness are checked by the
  /// consumers, not here.
  pub fn from_array(prices: Array2<f64>) -> Self {
    Self { prices }
  }

  pub fn view(&self) -> ArrayView2<'_, f64> {
    self.prices.view()
  }

  pub fn into_array(self) -> Array2<f64> {
    self.prices
  }

  pub fn paths(&self) -> usize {
    self.prices.nrows()
  }

  /// Number of steps, one less than the number of columns.
  pub fn steps(&self) -> usize {
    self.prices.ncols().saturating_sub(1)
  }

  pub fn path(&self, i: usize) -> ArrayView1<'_, f64> {
    self.prices.row(i)
  }

  pub fn final_prices(&self) -> Array1<f64> {
    match self.prices.ncols() {
      0 => Array1::zeros(0),
      n => self.prices.column(n - 1).to_owned(),
    }
  }

  /// Smallest and largest price, `None` for an empty or NaN-bearing matrix.
  pub fn price_range(&self) -> Option<(f64, f64)> {
    let lo = self.prices.min().ok()?;
    let hi = self.prices.max().ok()?;
    Some((*lo, *hi))
  }

  pub fn is_finite(&self) -> bool {
    self.prices.iter().all(|p| p.is_finite())
  }

  /// Row-per-path, comma-delimited export. Floats use the shortest
  /// representation that parses back to the same bits.
  pub fn write_csv<W: Write>(&self, mut out: W) -> io::Result<()> {
    for row in self.prices.axis_iter(Axis(0)) {
      let mut first = true;
      for p in row.iter() {
        if !first {
          out.write_all(b",")?;
        }
        write!(out, "{p:?}")?;
        first = false;
      }
      out.write_all(b"\n")?;
    }
    out.flush()
  }

  pub fn read_csv<R: BufRead>(input: R) -> io::Result<Self> {
    let mut values = Vec::new();
    let mut rows = 0usize;
    let mut cols: Option<usize> = None;

    for (line_no, line) in input.lines().enumerate() {
      let line = line?;
      if line.trim().is_empty() {
        continue;
      }

      let before = values.len();
      for field in line.split(',') {
        let value = field.trim().parse::<f64>().map_err(|err| {
          io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line {}: {err}", line_no + 1),
          )
        })?;
        values.push(value);
      }

      let width = values.len() - before;
      match cols {
        None => cols = Some(width),
        Some(c) if c != width => {
          return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line {}: expected {c} fields, found {width}", line_no + 1),
          ));
        }
        Some(_) => {}
      }
      rows += 1;
    }

    let prices = Array2::from_shape_vec((rows, cols.unwrap_or(0)), values)
      .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;
    Ok(Self { prices })
  }
}

/// Counters gathered while generating an ensemble.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationDiagnostics {
  /// Steps whose price underflowed or went non-finite and was clamped to
  /// the smallest positive `f64`.
  pub clamped_steps: u64,
  /// Total number of jumps applied over all paths and steps.
  pub jump_events: u64,
  /// Total number of earnings shocks applied over all paths.
  pub shock_events: u64,
  /// Path-steps spent in `[bull, bear]`, regime model only.
  pub regime_occupancy: Option<[u64; 2]>,
  /// Per-path regime trajectories (`0` bull, `1` bear), when requested.
  pub regimes: Option<Array2<u8>>,
}

impl GenerationDiagnostics {
  pub(crate) fn merge(mut self, other: Self) -> Self {
    self.clamped_steps += other.clamped_steps;
    self.jump_events += other.jump_events;
    self.shock_events += other.shock_events;
    self.regime_occupancy = match (self.regime_occupancy, other.regime_occupancy) {
      (Some(a), Some(b)) => Some([a[0] + b[0], a[1] + b[1]]),
      (a, b) => a.or(b),
    };
    self
  }
}

#[cfg(test)]
mod tests {
  use ndarray::array;

  use super::*;

  #[test]
  fn csv_round_trip_is_lossless() {
    let ensemble = PathEnsemble::from_array(array![
      [100.0, 101.234_567_890_123_45, 0.1 + 0.2],
      [100.0, f64::MIN_POSITIVE, 1e300]
    ]);

    let mut buf = Vec::new();
    ensemble.write_csv(&mut buf).unwrap();
    let back = PathEnsemble::read_csv(buf.as_slice()).unwrap();

    assert_eq!(back, ensemble);
    assert_eq!(back.paths(), 2);
    assert_eq!(back.steps(), 2);
  }

  #[test]
  fn ragged_csv_is_rejected() {
    let err = PathEnsemble::read_csv("1,2,3\n1,2\n".as_bytes()).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
  }

  #[test]
  fn final_prices_are_last_column() {
    let ensemble = PathEnsemble::from_array(array![[1.0, 2.0], [1.0, 3.0]]);
    assert_eq!(ensemble.final_prices(), array![2.0, 3.0]);
  }

  #[test]
  fn price_range_spans_the_matrix() {
    let ensemble = PathEnsemble::from_array(array![[5.0, 2.0, 9.0], [5.0, 7.0, 1.5]]);
    assert_eq!(ensemble.price_range(), Some((1.5, 9.0)));
    assert_eq!(PathEnsemble::from_array(array![[1.0, f64::NAN]]).price_range(), None);
  }

  #[test]
  fn diagnostics_merge_sums_counters() {
    let a = GenerationDiagnostics {
      clamped_steps: 1,
      jump_events: 2,
      shock_events: 5,
      regime_occupancy: Some([3, 4]),
      regimes: None,
    };
    let b = GenerationDiagnostics {
      clamped_steps: 10,
      jump_events: 20,
      shock_events: 50,
      regime_occupancy: Some([30, 40]),
      regimes: None,
    };
    let merged = a.merge(b);

    assert_eq!(merged.clamped_steps, 11);
    assert_eq!(merged.jump_events, 22);
    assert_eq!(merged.shock_events, 55);
    assert_eq!(merged.regime_occupancy, Some([33, 44]));
  }
}
