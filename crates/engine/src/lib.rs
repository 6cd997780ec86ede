//! Event-driven matching and accounting engine.
//!
//! This crate provides:
//! - Resting-order state machine with touch-ratio matching
//! - Cash/position/cost-basis ledger with separate fee accrual
//! - Exposure and stop-loss risk controller
//! - Funding settlement cursor
//! - The single-threaded deterministic simulation loop

pub mod funding;
pub mod ledger;
pub mod log;
pub mod order;
pub mod risk;
pub mod simulator;

pub use funding::FundingCursor;
pub use ledger::Ledger;
pub use log::Arena;
pub use order::RestingOrder;
pub use risk::RiskController;
pub use simulator::{RunOutput, Simulator};
