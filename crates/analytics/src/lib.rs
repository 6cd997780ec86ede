//! Performance reduction over completed run outputs.
//!
//! This crate provides:
//! - PnL decomposition (no-fee, virtual-close realized, unrealized, drift)
//! - Risk ratios on the fee-inclusive equity series
//! - Maker/taker/funding attribution
//! - Order fill, slippage, and operational-load statistics

pub mod report;

pub use report::{Analyzer, OrderSideMetrics, PerformanceReport, PnlBucket, RiskMetrics};
