//! # Markov chain
//!
//! $$
//! \mathbb P(R_{t+1}=j\mid R_t=i)=P_{ij},\quad R_0\sim\pi_0
//! $$
//!
use rand::Rng;

use crate::stochastic::model::BEAR;
use crate::stochastic::model::BULL;

/// Two-state chain driven by one uniform per transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TwoStateChain {
  transition: [[f64; 2]; 2],
  initial: [f64; 2],
}

impl TwoStateChain {
  pub fn new(transition: [[f64; 2]; 2], initial: [f64; 2]) -> Self {
    Self {
      transition,
      initial,
    }
  }

  #[inline]
  fn pick<R: Rng + ?Sized>(row: &[f64; 2], rng: &mut R) -> usize {
    let u: f64 = rng.gen();
    if u < row[BULL] {
      BULL
    } else {
      BEAR
    }
  }

  pub fn initial_state<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
    Self::pick(&self.initial, rng)
  }

  pub fn next_state<R: Rng + ?Sized>(&self, current: usize, rng: &mut R) -> usize {
    Self::pick(&self.transition[current], rng)
  }
}
