//! Lifecycle operation keys.
//!
//! An operation key names the target of an in-flight start/stop request:
//! either a whole symbol or one (symbol, exchange) pair. Stopping "all"
//! and stopping one exchange are distinct keys and never block each other.

use crate::symbol::{ExchangeId, SymbolId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Target of an in-flight lifecycle request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationKey {
    pub symbol_id: SymbolId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<ExchangeId>,
}

impl OperationKey {
    /// Key covering every exchange of a symbol.
    pub fn symbol(symbol_id: SymbolId) -> Self {
        Self {
            symbol_id,
            exchange: None,
        }
    }

    /// Key scoped to one exchange.
    pub fn exchange(symbol_id: SymbolId, exchange: ExchangeId) -> Self {
        Self {
            symbol_id,
            exchange: Some(exchange),
        }
    }

    /// Build from an optional exchange scope.
    pub fn scoped(symbol_id: SymbolId, exchange: Option<ExchangeId>) -> Self {
        Self {
            symbol_id,
            exchange,
        }
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.exchange {
            Some(exchange) => write!(f, "{}:{}", self.symbol_id, exchange),
            None => write!(f, "{}", self.symbol_id),
        }
    }
}

/// Transient lifecycle state guarded by an operation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Starting,
    Stopping,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Stopping => "stopping",
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
