//! Backend trait.
//!
//! Abstracts the control backend so the orchestrator can be driven by the
//! real REST API or by an in-memory mock in tests.

use std::pin::Pin;
use std::sync::Arc;

use gridctl_core::{ExchangeId, SymbolConfig};

use crate::error::ClientResult;
use crate::types::BackendStatus;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Backend call, as recorded by `MockBackend`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    ListConfiguredSymbols,
    ListTradableSymbols,
    ReplaceSymbols(Vec<SymbolConfig>),
    FetchStatus,
    StartSymbol {
        exchange: ExchangeId,
        symbol: String,
    },
    StopSymbol {
        symbol: String,
        exchange: Option<ExchangeId>,
    },
}

impl BackendCall {
    /// Short name used in logs and metric labels.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ListConfiguredSymbols => "list_configured",
            Self::ListTradableSymbols => "list_tradable",
            Self::ReplaceSymbols(_) => "replace_symbols",
            Self::FetchStatus => "fetch_status",
            Self::StartSymbol { .. } => "start_symbol",
            Self::StopSymbol { .. } => "stop_symbol",
        }
    }
}

/// REST surface of the grid-bot control backend.
pub trait BotBackend: Send + Sync {
    /// Stored symbol configuration (first TP/SL config per symbol).
    fn list_configured_symbols(&self) -> BoxFuture<'_, ClientResult<Vec<SymbolConfig>>>;

    /// Trading pairs the backend is able to run.
    fn list_tradable_symbols(&self) -> BoxFuture<'_, ClientResult<Vec<String>>>;

    /// Replace the stored configuration with exactly `symbols`.
    fn replace_symbols(&self, symbols: Vec<SymbolConfig>) -> BoxFuture<'_, ClientResult<()>>;

    /// Global and per-symbol lifecycle status.
    fn fetch_status(&self) -> BoxFuture<'_, ClientResult<BackendStatus>>;

    /// Start `symbol` on one exchange.
    fn start_symbol(&self, exchange: ExchangeId, symbol: String) -> BoxFuture<'_, ClientResult<()>>;

    /// Stop `symbol` on one exchange, or on every exchange when `None`.
    fn stop_symbol(
        &self,
        symbol: String,
        exchange: Option<ExchangeId>,
    ) -> BoxFuture<'_, ClientResult<()>>;
}

/// Arc wrapper for BotBackend trait objects.
pub type DynBackend = Arc<dyn BotBackend>;
