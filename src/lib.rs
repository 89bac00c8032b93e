//! # montecarlo-rs
//!
//! $$
//! \frac{dS_t}{S_{t^-}}=\mu_{R_t}\,dt+\sigma_{R_t}\,dW_t+dJ_t
//! $$
//!
//! Monte Carlo engine for asset prices: calibrate a diffusion, jump-diffusion
//! or regime-switching model to a historical series, generate a seeded path
//! ensemble in parallel, and summarise it with risk/return statistics.
//!
//! | Module         | Description                                                    |
//! |----------------|----------------------------------------------------------------|
//! | [`config`]     | Engine and calibration configuration.                          |
//! | [`error`]      | Error types of the three public contracts.                     |
//! | [`rng`]        | Seedable generator and per-path stream derivation.             |
//! | [`traits`]     | Path generator contract.                                       |
//! | [`quant`]      | Model calibration.                                             |
//! | [`stochastic`] | Models, generators and ensemble generation.                    |
//! | [`stats`]      | Returns, moments, quantiles and the statistics record.         |
//! | [`engine`]     | End-to-end and batch runs.                                     |

pub mod config;
pub mod engine;
pub mod error;
pub mod quant;
pub mod rng;
pub mod stats;
pub mod stochastic;
pub mod traits;

pub use engine::SimulationEngine;
pub use engine::SimulationRequest;
pub use error::AnalysisError;
pub use error::CalibrationError;
pub use error::EngineError;
pub use error::SimulationError;
pub use quant::calibrate;
pub use stats::analyze;
pub use stats::HistoricalSeries;
pub use stats::StatisticsRecord;
pub use stochastic::simulate;
pub use stochastic::ModelParameters;
pub use stochastic::ModelType;
pub use stochastic::PathEnsemble;
