//! # Stochastic Path Generation
//!
//! $$
//! \frac{dS_t}{S_{t^-}}=\mu_{R_t}\,dt+\sigma_{R_t}\,dW_t+dJ_t
//! $$
//!
//! `stochastic` generates Monte Carlo ensembles of asset prices under three
//! nested models: plain GBM, Merton jump-diffusion and a two-state regime
//! switching jump-diffusion.
//!
//! ## Modules
//!
//! | Module        | Description                                                              |
//! |---------------|--------------------------------------------------------------------------|
//! | [`model`]     | Model tags, parameter sets and their validation.                         |
//! | [`diffusion`] | Exact lognormal GBM step.                                                |
//! | [`process`]   | Compound Poisson jumps and the earnings shock overlay.                   |
//! | [`jump`]      | Merton jump-diffusion generator.                                         |
//! | [`regime`]    | Two-state Markov chain and the regime-switching generator.               |
//! | [`factory`]   | Maps a model and its parameters to a generator.                          |
//! | [`sampler`]   | Parallel ensemble generation with cancellation.                          |
//! | [`ensemble`]  | Path matrix and generation diagnostics.                                  |
//!
//! ## Reproducibility
//!
//! Path `i` draws from four streams seeded by `(seed, i, concern)`. Equal
//! seeds give bit-identical ensembles regardless of `chunk_rows`, thread
//! count or whether generation runs in parallel.
//!
//! ## Example Usage
//!
//! ```rust
//! use montecarlo_rs::stochastic::model::DiffusionParams;
//! use montecarlo_rs::stochastic::model::ModelParameters;
//! use montecarlo_rs::stochastic::model::ModelType;
//! use montecarlo_rs::stochastic::simulate;
//!
//! let params = ModelParameters::Diffusion(DiffusionParams::new(0.08, 0.2));
//! let out = simulate(ModelType::Diffusion, &params, 1_000, 252, 1.0 / 252.0, 100.0, 7)?;
//! ```

pub mod diffusion;
pub mod ensemble;
pub mod factory;
pub mod jump;
pub mod model;
pub mod process;
pub mod regime;
pub mod sampler;

pub use ensemble::GenerationDiagnostics;
pub use ensemble::PathEnsemble;
pub use factory::Generator;
pub use model::ModelParameters;
pub use model::ModelType;
pub use sampler::simulate;
pub use sampler::simulate_with;
pub use sampler::CancellationToken;
pub use sampler::SamplingOptions;
pub use sampler::SimulationOutput;
