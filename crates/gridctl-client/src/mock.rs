//! In-memory backend for tests.
//!
//! Behaves like the real backend (start/stop update the reported status,
//! replace overwrites the stored configuration), records every call, and can
//! be told to fail individual calls or to hold start/stop requests in flight
//! until released.

use std::collections::HashSet;
use std::sync::Arc;

use gridctl_core::{ExchangeId, SymbolConfig, SymbolStatusReport};
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::backend::{BackendCall, BotBackend, BoxFuture};
use crate::error::{ClientError, ClientResult};
use crate::types::BackendStatus;

#[derive(Debug, Default)]
struct MockState {
    configured: Vec<SymbolConfig>,
    tradable: Vec<String>,
    status: BackendStatus,
    calls: Vec<BackendCall>,
    fail_start_on: HashSet<ExchangeId>,
    fail_stop: bool,
    fail_status: bool,
    fail_list: bool,
    fail_replace: bool,
}

/// Mock control backend.
#[derive(Debug, Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
    start_gate: Mutex<Option<Arc<Semaphore>>>,
    stop_gate: Mutex<Option<Arc<Semaphore>>>,
    replace_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the stored configuration returned by `list_configured_symbols`.
    pub fn set_configured(&self, configs: Vec<SymbolConfig>) {
        self.state.lock().configured = configs;
    }

    /// Set the catalog returned by `list_tradable_symbols`.
    pub fn set_tradable(&self, symbols: Vec<String>) {
        self.state.lock().tradable = symbols;
    }

    /// Set the status returned by `fetch_status`.
    pub fn set_status(&self, status: BackendStatus) {
        self.state.lock().status = status;
    }

    /// Mark `symbol` as running on `exchanges` in the reported status.
    pub fn set_running(&self, symbol: &str, exchanges: &[&str]) {
        self.state.lock().status.active.insert(
            symbol.to_string(),
            SymbolStatusReport::running(exchanges.iter().map(|e| ExchangeId::new(e))),
        );
    }

    /// Make start requests for `exchange` fail with HTTP 500.
    pub fn fail_start_on(&self, exchange: &str) {
        self.state.lock().fail_start_on.insert(ExchangeId::new(exchange));
    }

    pub fn set_fail_stop(&self, fail: bool) {
        self.state.lock().fail_stop = fail;
    }

    pub fn set_fail_status(&self, fail: bool) {
        self.state.lock().fail_status = fail;
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.state.lock().fail_list = fail;
    }

    pub fn set_fail_replace(&self, fail: bool) {
        self.state.lock().fail_replace = fail;
    }

    /// Hold every subsequent start request until `release_starts`.
    pub fn hold_starts(&self) {
        *self.start_gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let `n` held start requests complete.
    pub fn release_starts(&self, n: usize) {
        if let Some(gate) = self.start_gate.lock().as_ref() {
            gate.add_permits(n);
        }
    }

    /// Hold every subsequent stop request until `release_stops`.
    pub fn hold_stops(&self) {
        *self.stop_gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let `n` held stop requests complete.
    pub fn release_stops(&self, n: usize) {
        if let Some(gate) = self.stop_gate.lock().as_ref() {
            gate.add_permits(n);
        }
    }

    /// Hold every subsequent replace request until `release_replaces`.
    pub fn hold_replaces(&self) {
        *self.replace_gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let `n` held replace requests complete.
    pub fn release_replaces(&self, n: usize) {
        if let Some(gate) = self.replace_gate.lock().as_ref() {
            gate.add_permits(n);
        }
    }

    /// Recorded calls, oldest first.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().calls.clone()
    }

    /// Number of recorded calls matching `pred`.
    pub fn count_calls(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Stored configuration, as last replaced.
    pub fn configured(&self) -> Vec<SymbolConfig> {
        self.state.lock().configured.clone()
    }

    fn record(&self, call: BackendCall) {
        self.state.lock().calls.push(call);
    }

    fn server_error(what: &str) -> ClientError {
        ClientError::Status {
            status: 500,
            body: format!("mock failure: {what}"),
        }
    }
}

async fn pass_gate(gate: Option<Arc<Semaphore>>) {
    if let Some(gate) = gate {
        if let Ok(permit) = gate.acquire().await {
            permit.forget();
        }
    }
}

impl BotBackend for MockBackend {
    fn list_configured_symbols(&self) -> BoxFuture<'_, ClientResult<Vec<SymbolConfig>>> {
        Box::pin(async move {
            self.record(BackendCall::ListConfiguredSymbols);
            let state = self.state.lock();
            if state.fail_list {
                return Err(Self::server_error("list configured"));
            }
            Ok(state.configured.clone())
        })
    }

    fn list_tradable_symbols(&self) -> BoxFuture<'_, ClientResult<Vec<String>>> {
        Box::pin(async move {
            self.record(BackendCall::ListTradableSymbols);
            let state = self.state.lock();
            if state.fail_list {
                return Err(Self::server_error("list tradable"));
            }
            Ok(state.tradable.clone())
        })
    }

    fn replace_symbols(&self, symbols: Vec<SymbolConfig>) -> BoxFuture<'_, ClientResult<()>> {
        Box::pin(async move {
            self.record(BackendCall::ReplaceSymbols(symbols.clone()));
            let gate = self.replace_gate.lock().clone();
            pass_gate(gate).await;

            let mut state = self.state.lock();
            if state.fail_replace {
                return Err(Self::server_error("replace"));
            }
            state.configured = symbols;
            Ok(())
        })
    }

    fn fetch_status(&self) -> BoxFuture<'_, ClientResult<BackendStatus>> {
        Box::pin(async move {
            self.record(BackendCall::FetchStatus);
            let state = self.state.lock();
            if state.fail_status {
                return Err(Self::server_error("status"));
            }
            Ok(state.status.clone())
        })
    }

    fn start_symbol(&self, exchange: ExchangeId, symbol: String) -> BoxFuture<'_, ClientResult<()>> {
        Box::pin(async move {
            self.record(BackendCall::StartSymbol {
                exchange: exchange.clone(),
                symbol: symbol.clone(),
            });
            let gate = self.start_gate.lock().clone();
            pass_gate(gate).await;

            let mut state = self.state.lock();
            if state.fail_start_on.contains(&exchange) {
                return Err(Self::server_error("start"));
            }
            state
                .status
                .active
                .entry(symbol)
                .and_modify(|report| {
                    report.status = gridctl_core::RunStatus::Running;
                    report.exchanges.insert(exchange.clone());
                })
                .or_insert_with(|| SymbolStatusReport::running([exchange.clone()]));
            Ok(())
        })
    }

    fn stop_symbol(
        &self,
        symbol: String,
        exchange: Option<ExchangeId>,
    ) -> BoxFuture<'_, ClientResult<()>> {
        Box::pin(async move {
            self.record(BackendCall::StopSymbol {
                symbol: symbol.clone(),
                exchange: exchange.clone(),
            });
            let gate = self.stop_gate.lock().clone();
            pass_gate(gate).await;

            let mut state = self.state.lock();
            if state.fail_stop {
                return Err(Self::server_error("stop"));
            }
            let now_empty = match state.status.active.get_mut(&symbol) {
                Some(report) => {
                    match &exchange {
                        Some(exchange) => {
                            report.exchanges.remove(exchange);
                        }
                        None => report.exchanges.clear(),
                    }
                    report.exchanges.is_empty()
                }
                None => false,
            };
            if now_empty {
                state.status.active.remove(&symbol);
            }
            Ok(())
        })
    }
}
