//! # Sampler
//!
//! $$
//! \mathbf S=\bigl[\mathcal G_\theta(S_0,\text{streams}_i)\bigr]_{i=0}^{P-1}
//! $$
//!
//! Ensemble generation. Rows are split into fixed-size chunks that rayon
//! fills independently; every path draws from its own seeded streams, so
//! the result is identical for any chunk size and for serial runs. An
//! optional earnings overlay shocks each path after the model has filled it.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use ndarray::parallel::prelude::*;
use ndarray::Array2;
use ndarray::ArrayViewMut2;
use ndarray::Axis;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::factory::Generator;
use crate::error::SimulationError;
use crate::rng::PathStreams;
use crate::stochastic::ensemble::GenerationDiagnostics;
use crate::stochastic::ensemble::PathEnsemble;
use crate::stochastic::model::ModelParameters;
use crate::stochastic::model::ModelType;
use crate::stochastic::process::EarningsShocks;
use crate::stochastic::process::ShockSchedule;
use crate::traits::PathGenerator;

/// Cooperative cancellation flag, checked between chunks.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.0.store(true, Ordering::SeqCst);
  }

  pub fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::SeqCst)
  }
}

/// Generation options. Apart from `earnings`, none of them changes the
/// generated values.
#[derive(Clone, Debug)]
pub struct SamplingOptions {
  pub chunk_rows: usize,
  pub parallel: bool,
  pub record_regimes: bool,
  pub cancel: Option<CancellationToken>,
  /// Earnings shock overlay, off when `None`.
  pub earnings: Option<EarningsShocks>,
}

impl Default for SamplingOptions {
  fn default() -> Self {
    Self {
      chunk_rows: 256,
      parallel: true,
      record_regimes: false,
      cancel: None,
      earnings: None,
    }
  }
}

/// Generated ensemble with its diagnostics.
#[derive(Clone, Debug)]
pub struct SimulationOutput {
  pub ensemble: PathEnsemble,
  pub diagnostics: GenerationDiagnostics,
}

struct ChunkOutcome {
  diagnostics: GenerationDiagnostics,
  regimes: Option<Array2<u8>>,
}

/// Generate `paths x (steps + 1)` prices with default execution options.
pub fn simulate(
  model_type: ModelType,
  params: &ModelParameters,
  paths: usize,
  steps: usize,
  dt: f64,
  initial_price: f64,
  seed: u64,
) -> Result<SimulationOutput, SimulationError> {
  simulate_with(
    model_type,
    params,
    paths,
    steps,
    dt,
    initial_price,
    seed,
    &SamplingOptions::default(),
  )
}

#[allow(clippy::too_many_arguments)]
#[tracing::instrument(skip(params, options), fields(model = %model_type))]
pub fn simulate_with(
  model_type: ModelType,
  params: &ModelParameters,
  paths: usize,
  steps: usize,
  dt: f64,
  initial_price: f64,
  seed: u64,
  options: &SamplingOptions,
) -> Result<SimulationOutput, SimulationError> {
  validate_request(paths, steps, dt, initial_price, options)?;
  params.validate()?;
  let generator = Generator::from_parameters(model_type, params, dt)?;
  let record = options.record_regimes && generator.has_regimes();
  let shocks = options
    .earnings
    .as_ref()
    .map(|e| e.schedule(steps))
    .transpose()?
    .filter(|s| !s.is_empty());

  info!(paths, steps, dt, seed, "generating path ensemble");

  let mut prices = Array2::<f64>::zeros((paths, steps + 1));
  let completed = AtomicUsize::new(0);
  let chunk_rows = options.chunk_rows;

  let run_chunk = |(index, block): (usize, ArrayViewMut2<f64>)| {
    if let Some(token) = &options.cancel {
      if token.is_cancelled() {
        return Err(SimulationError::Cancelled {
          completed_chunks: completed.load(Ordering::SeqCst),
        });
      }
    }
    let outcome = fill_chunk(
      &generator,
      shocks.as_ref(),
      block,
      index * chunk_rows,
      initial_price,
      seed,
      record,
    );
    completed.fetch_add(1, Ordering::SeqCst);
    Ok(outcome)
  };

  let chunks = prices.axis_chunks_iter_mut(Axis(0), chunk_rows);
  let outcomes: Vec<ChunkOutcome> = if options.parallel {
    chunks
      .into_par_iter()
      .enumerate()
      .map(run_chunk)
      .collect::<Result<_, _>>()?
  } else {
    chunks
      .into_iter()
      .enumerate()
      .map(run_chunk)
      .collect::<Result<_, _>>()?
  };

  let mut diagnostics = GenerationDiagnostics::default();
  let mut regime_blocks = Vec::new();
  for outcome in outcomes {
    diagnostics = diagnostics.merge(outcome.diagnostics);
    if let Some(block) = outcome.regimes {
      regime_blocks.push(block);
    }
  }
  if record {
    let views: Vec<_> = regime_blocks.iter().map(|b| b.view()).collect();
    let regimes = ndarray::concatenate(Axis(0), &views)
      .map_err(|err| SimulationError::NumericalInstability(err.to_string()))?;
    diagnostics.regimes = Some(regimes);
  }

  let ensemble = PathEnsemble::from_array(prices);
  if !ensemble.is_finite() {
    return Err(SimulationError::NumericalInstability(
      "non-finite price in generated ensemble".into(),
    ));
  }

  if diagnostics.clamped_steps > 0 {
    warn!(
      clamped = diagnostics.clamped_steps,
      "prices underflowed and were clamped to the smallest positive value"
    );
  }
  let (min_price, max_price) = ensemble.price_range().unwrap_or((f64::NAN, f64::NAN));
  debug!(
    min_price,
    max_price,
    jumps = diagnostics.jump_events,
    shocks = diagnostics.shock_events,
    occupancy = ?diagnostics.regime_occupancy,
    "ensemble generated"
  );

  Ok(SimulationOutput {
    ensemble,
    diagnostics,
  })
}

fn fill_chunk(
  generator: &Generator,
  shocks: Option<&ShockSchedule>,
  mut block: ArrayViewMut2<f64>,
  first_path: usize,
  initial_price: f64,
  seed: u64,
  record: bool,
) -> ChunkOutcome {
  let mut regimes = record.then(|| Array2::<u8>::zeros(block.raw_dim()));
  let mut diagnostics = GenerationDiagnostics {
    regime_occupancy: generator.has_regimes().then_some([0, 0]),
    ..Default::default()
  };

  for (offset, mut row) in block.axis_iter_mut(Axis(0)).enumerate() {
    row[0] = initial_price;
    let mut streams = PathStreams::new(seed, first_path + offset);
    let trace = regimes.as_mut().map(|r| r.row_mut(offset));
    let counters = generator.fill_path(row.view_mut(), &mut streams, trace);

    diagnostics.clamped_steps += counters.clamped_steps;
    diagnostics.jump_events += counters.jump_events;
    if let Some(schedule) = shocks {
      let shocked = schedule.apply(row, &mut streams.shock);
      diagnostics.clamped_steps += shocked.clamped_steps;
      diagnostics.shock_events += shocked.shock_events;
    }
    if let Some(occupancy) = diagnostics.regime_occupancy.as_mut() {
      occupancy[0] += counters.occupancy[0];
      occupancy[1] += counters.occupancy[1];
    }
  }

  ChunkOutcome {
    diagnostics,
    regimes,
  }
}

fn validate_request(
  paths: usize,
  steps: usize,
  dt: f64,
  initial_price: f64,
  options: &SamplingOptions,
) -> Result<(), SimulationError> {
  if paths == 0 || steps == 0 {
    return Err(SimulationError::InvalidRequest(format!(
      "paths and steps must be >= 1, got {paths} and {steps}"
    )));
  }
  if !(dt.is_finite() && dt > 0.0) {
    return Err(SimulationError::InvalidRequest(format!(
      "dt must be finite and > 0, got {dt}"
    )));
  }
  if !(initial_price.is_finite() && initial_price > 0.0) {
    return Err(SimulationError::InvalidRequest(format!(
      "initial price must be finite and > 0, got {initial_price}"
    )));
  }
  if options.chunk_rows == 0 {
    return Err(SimulationError::InvalidRequest(
      "chunk_rows must be >= 1".into(),
    ));
  }
  Ok(())
}
