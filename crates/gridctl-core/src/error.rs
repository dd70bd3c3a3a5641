//! Error types for gridctl-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Invalid exchange: {0}")]
    InvalidExchange(String),

    #[error("Invalid percentage: {0}")]
    InvalidPercent(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
