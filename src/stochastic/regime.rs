//! # Regime
//!
//! $$
//! R_t\in\{\text{bull},\text{bear}\},\quad P=\begin{pmatrix}p_{bb}&1-p_{bb}\\1-p_{ss}&p_{ss}\end{pmatrix}
//! $$
//!
pub mod markov;
pub mod switching;

pub use markov::TwoStateChain;
pub use switching::RegimeSwitching;
