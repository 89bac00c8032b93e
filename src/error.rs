//! # Errors
//!
//! $$
//! \text{calibrate}\to\mathcal{E}_c,\quad \text{simulate}\to\mathcal{E}_s,\quad \text{analyze}\to\mathcal{E}_a
//! $$
//!
//! One error type per public contract. None of these are retried: they
//! report invalid input or too little data, never a transient condition.

use thiserror::Error;

/// Failure while turning a historical series into model parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
  #[error("invalid price {price} at index {index}: prices must be finite and > 0")]
  InvalidPrice { index: usize, price: f64 },
  #[error("timestamps must be strictly increasing, violated at index {index}")]
  UnorderedTimestamps { index: usize },
  #[error("insufficient data: {context} needs at least {required} observations, got {actual}")]
  InsufficientData {
    context: &'static str,
    required: usize,
    actual: usize,
  },
  #[error("numerical instability: {0}")]
  NumericalInstability(String),
}

/// Failure while generating a path ensemble.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
  #[error("invalid request: {0}")]
  InvalidRequest(String),
  #[error("numerical instability: {0}")]
  NumericalInstability(String),
  #[error("simulation cancelled after {completed_chunks} chunk(s)")]
  Cancelled { completed_chunks: usize },
}

/// Failure while computing statistics over a path ensemble.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
  #[error("invalid ensemble: {0}")]
  InvalidEnsemble(String),
}

/// Error of a full calibrate -> simulate -> analyze run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
  #[error(transparent)]
  Calibration(#[from] CalibrationError),
  #[error(transparent)]
  Simulation(#[from] SimulationError),
  #[error(transparent)]
  Analysis(#[from] AnalysisError),
  #[error("invalid configuration: {0}")]
  Config(String),
}

impl CalibrationError {
  pub(crate) fn insufficient(context: &'static str, required: usize, actual: usize) -> Self {
    Self::InsufficientData {
      context,
      required,
      actual,
    }
  }
}
