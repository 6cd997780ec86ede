//! Error types for the mmsim backtest engine.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the mmsim backtest engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input feed failed validation before the run started.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An output arena ran out of preallocated capacity.
    #[error("Output capacity exceeded: needed {needed}, capacity {capacity}")]
    CapacityExceeded { needed: usize, capacity: usize },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an input validation error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}
