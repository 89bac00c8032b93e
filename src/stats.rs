//! # Stats
//!
//! $$
//! \{S_{i,t}\}\mapsto\bigl(\bar R,\ \sigma_R,\ Q_R(q),\ \mathrm{VaR}_\alpha,\ \mathrm{CVaR}_\alpha,\ \mathrm{MDD}\bigr)
//! $$
//!
//! | Module       | Description                                                        |
//! |--------------|--------------------------------------------------------------------|
//! | [`returns`]  | Historical series and log-return preprocessing.                    |
//! | [`moments`]  | Central moments via chunked partial reduction.                     |
//! | [`quantile`] | Linear-interpolation quantiles over sorted samples.                |
//! | [`drawdown`] | Per-path maximum drawdown.                                         |
//! | [`normality`]| D'Agostino-Pearson omnibus normality test.                         |
//! | [`report`]   | Full risk/return statistics record of a path ensemble.             |

pub mod drawdown;
pub mod moments;
pub mod normality;
pub mod quantile;
pub mod report;
pub mod returns;

pub use report::analyze;
pub use report::StatisticsRecord;
pub use returns::HistoricalSeries;
pub use returns::ReturnSeries;
