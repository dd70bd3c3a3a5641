//! Core domain types for gridctl.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `SymbolId`, `ExchangeId`: row and venue identifiers
//! - `Symbol`: one configured trading pair with TP/SL and lifecycle fields
//! - `SymbolConfig`: the persisted (symbol, tp, sl) triple
//! - `OperationKey`, `OperationStatus`: in-flight lifecycle guards
//! - `ActiveStatus`: the backend's per-symbol run status snapshot

pub mod error;
pub mod operation;
pub mod status;
pub mod symbol;

pub use error::{CoreError, Result};
pub use operation::{OperationKey, OperationStatus};
pub use status::{ActiveStatus, RunStatus, SymbolStatusReport};
pub use symbol::{
    normalize_symbol, ExchangeId, Symbol, SymbolConfig, SymbolId, DEFAULT_STOP_LOSS_PERCENT,
    DEFAULT_TAKE_PROFIT_PERCENT,
};
