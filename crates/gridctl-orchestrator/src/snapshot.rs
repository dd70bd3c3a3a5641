//! Read-only view of orchestrator state for presentation layers.

use chrono::{DateTime, Utc};
use gridctl_core::{ExchangeId, OperationStatus, Symbol, SymbolId};
use gridctl_registry::InFlightOperation;
use rust_decimal::Decimal;
use serde::Serialize;

/// One registry row as displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolView {
    pub id: SymbolId,
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub take_profit_percent: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub stop_loss_percent: Decimal,
    pub exchanges: Vec<ExchangeId>,
    pub running: bool,
    /// Transient state of any in-flight operation on this row.
    pub pending: Option<OperationStatus>,
}

impl SymbolView {
    pub(crate) fn new(row: &Symbol, in_flight: &[InFlightOperation]) -> Self {
        let mut pending = None;
        for op in in_flight.iter().filter(|op| op.key.symbol_id == row.id) {
            if pending != Some(OperationStatus::Stopping) {
                pending = Some(op.status);
            }
        }
        Self {
            id: row.id.clone(),
            symbol: row.symbol.clone(),
            take_profit_percent: row.take_profit_percent,
            stop_loss_percent: row.stop_loss_percent,
            exchanges: row.exchanges().iter().cloned().collect(),
            running: row.is_running(),
            pending,
        }
    }
}

/// Orchestrator state at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrySnapshot {
    pub rows: Vec<SymbolView>,
    pub edit_session: bool,
    /// A configuration save is awaiting the backend.
    pub saving: bool,
    pub in_flight: Vec<InFlightOperation>,
    /// Global backend status, if known.
    pub backend_running: Option<bool>,
    pub taken_at: DateTime<Utc>,
}

impl RegistrySnapshot {
    /// First row for `symbol` (exact, normalized match).
    pub fn row(&self, symbol: &str) -> Option<&SymbolView> {
        let wanted = gridctl_core::normalize_symbol(symbol);
        self.rows.iter().find(|row| row.symbol == wanted)
    }

    pub fn running_count(&self) -> usize {
        self.rows.iter().filter(|row| row.running).count()
    }
}

impl Default for RegistrySnapshot {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            edit_session: false,
            saving: false,
            in_flight: Vec::new(),
            backend_running: None,
            taken_at: Utc::now(),
        }
    }
}
