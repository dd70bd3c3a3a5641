//! Orchestrator error types.
//!
//! Only precondition failures are errors. Backend failures are reported
//! through the outcome types instead.

use gridctl_core::{CoreError, SymbolId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("No exchange selected")]
    NoExchangeSelected,

    #[error("Edit session is active")]
    EditSessionActive,

    #[error("Edit session is not active")]
    EditSessionInactive,

    #[error("Unknown symbol row: {0}")]
    UnknownSymbol(SymbolId),

    #[error("Symbol row {0} has no trading pair")]
    EmptySymbol(SymbolId),

    #[error("Symbol {0} is running")]
    SymbolRunning(String),

    #[error("Lifecycle operation in flight for {0}")]
    OperationInFlight(SymbolId),

    #[error("Save in flight")]
    SaveInFlight,

    #[error("Invalid value: {0}")]
    Invalid(#[from] CoreError),

    #[error("Exchange selection error: {0}")]
    Selection(String),
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
