//! Core types and configuration for the mmsim backtest engine.
//!
//! This crate provides shared types used across all other crates:
//! - Market event and account record types
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::SimConfig;
pub use error::{Error, Result};
pub use types::*;
