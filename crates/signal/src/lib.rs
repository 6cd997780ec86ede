//! Rolling market-state calculators for quoting policies.
//!
//! This crate provides:
//! - Trailing k-second return over a timestamped price window
//! - Median absolute trailing return (base spread input)
//! - Percentile rank over a rolling observation window

pub mod dispersion;
pub mod percentile;
pub mod trailing;

pub use dispersion::MedianAbsReturn;
pub use percentile::PercentileRank;
pub use trailing::TrailingReturn;
