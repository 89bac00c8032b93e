//! # Quant
//!
//! $$
//! \hat\theta=\arg\max_\theta\ \mathcal L(\theta\mid r_1,\dots,r_n)
//! $$
//!
//! | Module          | Description                                                       |
//! |-----------------|-------------------------------------------------------------------|
//! | [`calibration`] | GBM MLE, threshold jump detection and regime estimation.          |

pub mod calibration;

pub use calibration::calibrate;
pub use calibration::calibrate_returns;
