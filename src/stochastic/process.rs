//! # Process
//!
//! $$
//! N_t\sim\mathrm{Poi}(\lambda t),\quad J_t=\sum_{k\le N_t}Y_k
//! $$
//!
pub mod cpoisson;
pub mod earnings;

pub use cpoisson::CompoundPoisson;
pub use cpoisson::JumpDraw;
pub use earnings::EarningsShocks;
pub use earnings::ShockSchedule;
