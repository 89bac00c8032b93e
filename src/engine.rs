//! # Engine
//!
//! $$
//! \text{history}\ \xrightarrow{\ \text{calibrate}\ }\ \hat\theta\ \xrightarrow{\ \text{simulate}\ }\ \mathbf S\ \xrightarrow{\ \text{analyze}\ }\ \text{statistics}
//! $$
//!
//! End-to-end runs and parallel batches of independent runs.

use impl_new_derive::ImplNew;
use rayon::prelude::*;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;
use tracing::warn;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::error::SimulationError;
use crate::quant::calibrate;
use crate::stats::report::analyze_with_confidences;
use crate::stats::HistoricalSeries;
use crate::stats::StatisticsRecord;
use crate::stochastic::process::EarningsShocks;
use crate::stochastic::CancellationToken;
use crate::stochastic::GenerationDiagnostics;
use crate::stochastic::ModelParameters;
use crate::stochastic::ModelType;
use crate::stochastic::PathEnsemble;
use crate::stochastic::SamplingOptions;

/// One simulation job.
///
/// Parameters are calibrated from the history when absent. The initial
/// price defaults to the last historical price.
#[derive(ImplNew, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
  pub model_type: ModelType,
  pub paths: usize,
  pub steps: usize,
  pub seed: u64,
  #[serde(default)]
  pub dt: Option<f64>,
  #[serde(default)]
  pub initial_price: Option<f64>,
  #[serde(default)]
  pub parameters: Option<ModelParameters>,
  /// Earnings shock overlay applied to every path.
  #[serde(default)]
  pub earnings: Option<EarningsShocks>,
}

/// Labelled request of a batch.
#[derive(ImplNew, Clone, Debug)]
pub struct BatchItem {
  pub label: String,
  pub request: SimulationRequest,
  pub history: Option<HistoricalSeries>,
}

/// Everything a run produced.
#[derive(Clone, Debug, Serialize)]
pub struct SimulationOutcome {
  pub parameters: ModelParameters,
  pub initial_price: f64,
  pub dt: f64,
  #[serde(skip)]
  pub ensemble: PathEnsemble,
  pub diagnostics: GenerationDiagnostics,
  pub statistics: StatisticsRecord,
}

pub struct SimulationEngine {
  config: EngineConfig,
  cancel: CancellationToken,
}

impl SimulationEngine {
  pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
    config.validate()?;
    Ok(Self {
      config,
      cancel: CancellationToken::new(),
    })
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  /// Token that aborts running and pending work of this engine.
  pub fn cancellation_token(&self) -> CancellationToken {
    self.cancel.clone()
  }

  #[tracing::instrument(skip_all, fields(model = %request.model_type, paths = request.paths, steps = request.steps))]
  pub fn run(
    &self,
    request: &SimulationRequest,
    history: Option<&HistoricalSeries>,
  ) -> Result<SimulationOutcome, EngineError> {
    let parameters = match (&request.parameters, history) {
      (Some(p), _) => *p,
      (None, Some(series)) => calibrate(series, request.model_type, &self.config.calibration())?,
      (None, None) => {
        return Err(
          SimulationError::InvalidRequest("either parameters or a history is required".into())
            .into(),
        )
      }
    };

    let initial_price = request
      .initial_price
      .or_else(|| history.and_then(HistoricalSeries::last_price))
      .ok_or_else(|| SimulationError::InvalidRequest("no initial price".into()))?;
    let dt = request.dt.unwrap_or(self.config.dt);

    let options = SamplingOptions {
      chunk_rows: self.config.chunk_rows,
      parallel: self.config.parallel,
      record_regimes: self.config.record_regimes,
      cancel: Some(self.cancel.clone()),
      earnings: request.earnings.clone(),
    };
    let output = crate::stochastic::simulate_with(
      request.model_type,
      &parameters,
      request.paths,
      request.steps,
      dt,
      initial_price,
      request.seed,
      &options,
    )?;

    let statistics = analyze_with_confidences(
      &output.ensemble,
      initial_price,
      self.config.risk_free_rate,
      &self.config.var_confidences,
    )?;

    info!(
      mean_final = statistics.mean_final_price,
      prob_profit = statistics.prob_profit,
      "run finished"
    );

    Ok(SimulationOutcome {
      parameters,
      initial_price,
      dt,
      ensemble: output.ensemble,
      diagnostics: output.diagnostics,
      statistics,
    })
  }

  /// Run independent items in parallel. Each item keeps its own result;
  /// items not started before cancellation report `Cancelled`.
  pub fn run_batch(&self, items: &[BatchItem]) -> Vec<(String, Result<SimulationOutcome, EngineError>)> {
    info!(items = items.len(), "running batch");

    items
      .par_iter()
      .map(|item| {
        let result = if self.cancel.is_cancelled() {
          Err(SimulationError::Cancelled { completed_chunks: 0 }.into())
        } else {
          self.run(&item.request, item.history.as_ref())
        };
        if let Err(err) = &result {
          warn!(label = %item.label, %err, "batch item failed");
        }
        (item.label.clone(), result)
      })
      .collect()
  }
}
