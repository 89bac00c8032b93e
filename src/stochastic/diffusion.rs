//! # Diffusion
//!
//! $$
//! dS_t=\mu S_t\,dt+\sigma S_t\,dW_t
//! $$
//!
pub mod gbm;

pub use gbm::Gbm;
pub use gbm::LognormalStep;
