//! # Jump
//!
//! $$
//! \frac{dS_t}{S_{t^-}}=\mu\,dt+\sigma\,dW_t+d\Big(\sum_{k\le N_t}(e^{Y_k}-1)\Big)
//! $$
//!
pub mod merton;

pub use merton::Merton;
