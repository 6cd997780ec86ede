//! Quoting policies for the mmsim backtest engine.
//!
//! This crate provides:
//! - The `QuotingPolicy` trait and its decision types
//! - Symmetric grid quoting
//! - Momentum-tilted quoting with percentile regime bands
//! - Asymmetric distance/size quoting with a signal-ranked band table
//! - The time-scheduled hedge overlay

pub mod as_model;
pub mod decision;
pub mod grid;
pub mod hedge;
pub mod momentum;

pub use as_model::AsModel;
pub use decision::{QuoteContext, QuoteDecision, QuoteInstruction, QuotingPolicy};
pub use grid::SymmetricGrid;
pub use hedge::HedgeSchedule;
pub use momentum::MomentumTilted;
