//! Lifecycle orchestrator.
//!
//! Owns the symbol registry, the tradable catalog, the edit session and the
//! operation-key registry. Every method takes `&self`; state lives behind
//! short-lived locks that are never held across a backend call, so
//! independent operations (for example stops on two exchanges of the same
//! symbol) can run concurrently.
//!
//! Lock order is edit session, then registry. Structural edits are refused
//! while a save is in flight.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use futures_util::future::join_all;
use gridctl_client::DynBackend;
use gridctl_core::{
    normalize_symbol, CoreError, ExchangeId, OperationKey, OperationStatus, Symbol, SymbolId,
};
use gridctl_registry::{reconcile, OperationRegistry, SymbolCatalog, SymbolRegistry};
use gridctl_telemetry::Metrics;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::edit_session::EditSession;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::outcome::{SaveOutcome, StartOutcome, StopOutcome, SyncOutcome};
use crate::selection::DynSelection;
use crate::snapshot::{RegistrySnapshot, SymbolView};

/// Sole mutator of the symbol registry.
pub struct LifecycleOrchestrator {
    backend: DynBackend,
    selection: DynSelection,
    registry: RwLock<SymbolRegistry>,
    catalog: RwLock<SymbolCatalog>,
    edit: Mutex<EditSession>,
    operations: OperationRegistry,
    backend_running: RwLock<Option<bool>>,
    saving: AtomicBool,
    configuration_loaded: AtomicBool,
    catalog_loaded: AtomicBool,
    tx: watch::Sender<RegistrySnapshot>,
}

impl LifecycleOrchestrator {
    pub fn new(backend: DynBackend, selection: DynSelection) -> Self {
        let (tx, _rx) = watch::channel(RegistrySnapshot::default());
        Self {
            backend,
            selection,
            registry: RwLock::new(SymbolRegistry::new()),
            catalog: RwLock::new(SymbolCatalog::new()),
            edit: Mutex::new(EditSession::new()),
            operations: OperationRegistry::new(),
            backend_running: RwLock::new(None),
            saving: AtomicBool::new(false),
            configuration_loaded: AtomicBool::new(false),
            catalog_loaded: AtomicBool::new(false),
            tx,
        }
    }

    // ------------------------------------------------------------------
    // Synchronization with the backend
    // ------------------------------------------------------------------

    /// Load configuration and catalog, then reconcile with live status.
    ///
    /// A catalog failure is logged and does not fail initialization.
    pub async fn initialize(&self) -> OrchestratorResult<SyncOutcome> {
        let loaded = self.load_configuration().await?;
        if !loaded.is_ok() {
            return Ok(loaded);
        }
        self.load_catalog().await;
        Ok(self.refresh_status().await)
    }

    /// Replace the registry with the backend's stored configuration.
    ///
    /// Lifecycle fields start empty; call `refresh_status` afterwards.
    /// Refused while an edit session is active.
    pub async fn load_configuration(&self) -> OrchestratorResult<SyncOutcome> {
        self.ensure_not_editing()?;

        let result = timed("list_configured", self.backend.list_configured_symbols()).await;
        let outcome = match result {
            Ok(configs) => {
                let mut registry = self.registry.write();
                registry.load(configs);
                self.configuration_loaded.store(true, Ordering::Release);
                info!(rows = registry.len(), "Symbol configuration loaded");
                SyncOutcome::Loaded {
                    rows: registry.len(),
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to load symbol configuration");
                SyncOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };
        self.publish();
        Ok(outcome)
    }

    /// Replace the tradable-symbol catalog.
    pub async fn load_catalog(&self) -> SyncOutcome {
        match timed("list_tradable", self.backend.list_tradable_symbols()).await {
            Ok(symbols) => {
                let mut catalog = self.catalog.write();
                catalog.replace(symbols);
                self.catalog_loaded.store(true, Ordering::Release);
                debug!(symbols = catalog.len(), "Tradable symbol catalog loaded");
                SyncOutcome::Loaded {
                    rows: catalog.len(),
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to load tradable symbols");
                SyncOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Fetch live status and reconcile it into the registry.
    ///
    /// On failure local state is left unchanged.
    pub async fn refresh_status(&self) -> SyncOutcome {
        let status = match timed("fetch_status", self.backend.fetch_status()).await {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "Failed to fetch backend status");
                Metrics::reconcile("failed");
                return SyncOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let summary = reconcile(&mut self.registry.write(), &status.active);
        *self.backend_running.write() = status.running;
        Metrics::reconcile("ok");
        if summary.changed > 0 {
            info!(
                matched = summary.matched,
                running = summary.running,
                changed = summary.changed,
                "Backend status reconciled"
            );
        }
        self.publish();
        SyncOutcome::Reconciled(summary)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start a symbol on every selected exchange concurrently.
    ///
    /// The symbol gains exactly the exchanges whose request succeeded.
    /// A second call while a start is in flight sends nothing.
    pub async fn start(&self, id: &SymbolId) -> OrchestratorResult<StartOutcome> {
        self.ensure_not_editing()?;
        let symbol = self.lifecycle_symbol(id)?;

        let exchanges = self.selection.get();
        if exchanges.is_empty() {
            warn!(%symbol, "Start refused: no exchange selected");
            return Err(OrchestratorError::NoExchangeSelected);
        }

        let Some(guard) = self
            .operations
            .try_begin(OperationKey::symbol(id.clone()), OperationStatus::Starting)
        else {
            debug!(%symbol, "Start already in flight");
            Metrics::lifecycle_request("start", StartOutcome::AlreadyInFlight.label());
            return Ok(StartOutcome::AlreadyInFlight);
        };
        info!(%symbol, exchanges = ?exchanges, "Starting symbol");
        self.publish();

        let requests = exchanges.iter().map(|exchange| {
            timed(
                "start_symbol",
                self.backend.start_symbol(exchange.clone(), symbol.clone()),
            )
        });
        let results = join_all(requests).await;

        let mut started = Vec::new();
        let mut failed = Vec::new();
        for (exchange, result) in exchanges.into_iter().zip(results) {
            match result {
                Ok(()) => started.push(exchange),
                Err(e) => {
                    warn!(%symbol, %exchange, error = %e, "Start request failed");
                    failed.push((exchange, e.to_string()));
                }
            }
        }
        drop(guard);

        if !started.is_empty() {
            self.with_row(id, &symbol, |row| {
                for exchange in &started {
                    row.add_exchange(exchange.clone());
                }
            });
        }
        if !failed.is_empty() && !started.is_empty() {
            warn!(
                %symbol,
                started = started.len(),
                failed = failed.len(),
                "Symbol only partially started"
            );
        } else if !started.is_empty() {
            info!(%symbol, exchanges = started.len(), "Symbol started");
        }

        let outcome = StartOutcome::Completed { started, failed };
        Metrics::lifecycle_request("start", outcome.label());
        self.publish();
        Ok(outcome)
    }

    /// Stop a symbol on one exchange, or on all of them when `exchange` is
    /// `None`.
    pub async fn stop(
        &self,
        id: &SymbolId,
        exchange: Option<ExchangeId>,
    ) -> OrchestratorResult<StopOutcome> {
        self.ensure_not_editing()?;
        let symbol = self.lifecycle_symbol(id)?;

        let key = OperationKey::scoped(id.clone(), exchange.clone());
        let Some(guard) = self.operations.try_begin(key, OperationStatus::Stopping) else {
            debug!(%symbol, exchange = ?exchange, "Stop already in flight");
            Metrics::lifecycle_request("stop", StopOutcome::AlreadyInFlight.label());
            return Ok(StopOutcome::AlreadyInFlight);
        };
        info!(%symbol, exchange = ?exchange, "Stopping symbol");
        self.publish();

        let result = timed(
            "stop_symbol",
            self.backend.stop_symbol(symbol.clone(), exchange.clone()),
        )
        .await;
        drop(guard);

        let outcome = match result {
            Ok(()) => {
                self.with_row(id, &symbol, |row| match &exchange {
                    Some(exchange) => {
                        row.remove_exchange(exchange);
                    }
                    None => row.clear_exchanges(),
                });
                info!(%symbol, exchange = ?exchange, "Symbol stopped");
                StopOutcome::Stopped
            }
            Err(e) => {
                warn!(%symbol, exchange = ?exchange, error = %e, "Stop request failed");
                StopOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };
        Metrics::lifecycle_request("stop", outcome.label());
        self.publish();
        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Edit session
    // ------------------------------------------------------------------

    /// Enter the edit session. Returns false if it was already active.
    pub fn enter_edit(&self) -> bool {
        let entered = {
            let mut edit = self.edit.lock();
            let rows = self.registry.read().rows().to_vec();
            edit.enter(&rows)
        };
        if entered {
            debug!("Edit session entered");
            self.publish();
        }
        entered
    }

    /// Discard structural edits made since the session was entered.
    ///
    /// Returns false if no session was active or a save is in flight.
    pub fn cancel_edit(&self) -> bool {
        let cancelled = {
            let mut edit = self.edit.lock();
            if self.is_saving() {
                debug!("Cancel refused: save in flight");
                return false;
            }
            let mut registry = self.registry.write();
            match edit.cancel(registry.rows()) {
                Some(rows) => {
                    registry.replace_rows(rows);
                    true
                }
                None => false,
            }
        };
        if cancelled {
            debug!("Edit session cancelled");
            self.publish();
        }
        cancelled
    }

    /// Append a blank row and enter the edit session.
    pub fn add(&self) -> OrchestratorResult<SymbolId> {
        let id = {
            let mut edit = self.edit.lock();
            if self.is_saving() {
                return Err(OrchestratorError::SaveInFlight);
            }
            if !edit.is_active() {
                let rows = self.registry.read().rows().to_vec();
                edit.enter(&rows);
            }
            self.registry.write().add()
        };
        debug!(%id, "Row added");
        self.publish();
        Ok(id)
    }

    /// Overwrite a row's symbol and TP/SL.
    ///
    /// Requires an active edit session, a stopped row and no in-flight
    /// operation on it.
    pub fn update(
        &self,
        id: &SymbolId,
        symbol: &str,
        take_profit_percent: Decimal,
        stop_loss_percent: Decimal,
    ) -> OrchestratorResult<()> {
        for (name, value) in [("tp", take_profit_percent), ("sl", stop_loss_percent)] {
            if value.is_sign_negative() {
                return Err(CoreError::InvalidPercent(format!("{name} must be >= 0, got {value}")).into());
            }
        }
        {
            let edit = self.edit.lock();
            let mut registry = self.registry.write();
            self.ensure_editable(&edit, &registry, id)?;
            registry.update(id, symbol, take_profit_percent, stop_loss_percent);
        }
        debug!(%id, symbol = %normalize_symbol(symbol), %take_profit_percent, %stop_loss_percent, "Row updated");
        self.publish();
        Ok(())
    }

    /// Delete a row locally. Persisted on the next `save`.
    pub fn remove(&self, id: &SymbolId) -> OrchestratorResult<Symbol> {
        let removed = {
            let edit = self.edit.lock();
            let mut registry = self.registry.write();
            self.ensure_editable(&edit, &registry, id)?;
            registry
                .remove(id)
                .ok_or_else(|| OrchestratorError::UnknownSymbol(id.clone()))?
        };
        debug!(%id, symbol = %removed.symbol, "Row removed");
        self.publish();
        Ok(removed)
    }

    /// Replace the backend configuration with every non-blank row and leave
    /// the edit session.
    ///
    /// The request is sent even when no row qualifies. On failure the
    /// session stays active. Structural edits are refused until the request
    /// settles.
    pub async fn save(&self) -> SaveOutcome {
        let (configs, saving) = {
            let _edit = self.edit.lock();
            let Some(guard) = SaveGuard::try_acquire(&self.saving) else {
                debug!("Save already in flight");
                Metrics::lifecycle_request("save", SaveOutcome::AlreadyInFlight.label());
                return SaveOutcome::AlreadyInFlight;
            };
            (self.registry.read().persistable_configs(), guard)
        };
        let count = configs.len();
        self.publish();

        let result = timed("replace_symbols", self.backend.replace_symbols(configs.clone())).await;
        let outcome = match result {
            Ok(()) => {
                {
                    let mut edit = self.edit.lock();
                    self.registry.write().commit_saved(&configs);
                    edit.finish();
                }
                info!(symbols = count, "Symbol configuration saved");
                SaveOutcome::Saved { symbols: count }
            }
            Err(e) => {
                warn!(error = %e, "Failed to save symbol configuration");
                SaveOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };
        Metrics::lifecycle_request("save", outcome.label());
        drop(saving);
        self.publish();
        outcome
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn is_editing(&self) -> bool {
        self.edit.lock().is_active()
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    /// True once a configuration load has succeeded.
    pub fn is_configuration_loaded(&self) -> bool {
        self.configuration_loaded.load(Ordering::Acquire)
    }

    /// True once a catalog load has succeeded.
    pub fn is_catalog_loaded(&self) -> bool {
        self.catalog_loaded.load(Ordering::Acquire)
    }

    /// Id of the first row trading `symbol`.
    pub fn find_id(&self, symbol: &str) -> Option<SymbolId> {
        self.registry
            .read()
            .find_by_symbol(symbol)
            .map(|row| row.id.clone())
    }

    pub fn get(&self, id: &SymbolId) -> Option<Symbol> {
        self.registry.read().get(id).cloned()
    }

    /// Tradable symbols containing `term`.
    pub fn search_tradable(&self, term: &str) -> Vec<String> {
        self.catalog
            .read()
            .search(term)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn is_tradable(&self, symbol: &str) -> bool {
        self.catalog.read().contains(symbol)
    }

    /// Current state.
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.tx.borrow().clone()
    }

    /// Receiver notified after every change.
    pub fn subscribe(&self) -> watch::Receiver<RegistrySnapshot> {
        self.tx.subscribe()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn ensure_not_editing(&self) -> OrchestratorResult<()> {
        if self.edit.lock().is_active() {
            return Err(OrchestratorError::EditSessionActive);
        }
        Ok(())
    }

    /// Trading pair of a row eligible for a lifecycle action.
    fn lifecycle_symbol(&self, id: &SymbolId) -> OrchestratorResult<String> {
        let registry = self.registry.read();
        let row = registry
            .get(id)
            .ok_or_else(|| OrchestratorError::UnknownSymbol(id.clone()))?;
        if row.is_blank() {
            return Err(OrchestratorError::EmptySymbol(id.clone()));
        }
        Ok(row.symbol.clone())
    }

    fn ensure_editable(
        &self,
        edit: &EditSession,
        registry: &SymbolRegistry,
        id: &SymbolId,
    ) -> OrchestratorResult<()> {
        if !edit.is_active() {
            return Err(OrchestratorError::EditSessionInactive);
        }
        if self.is_saving() {
            return Err(OrchestratorError::SaveInFlight);
        }
        let row = registry
            .get(id)
            .ok_or_else(|| OrchestratorError::UnknownSymbol(id.clone()))?;
        if self.operations.is_symbol_busy(id) {
            return Err(OrchestratorError::OperationInFlight(id.clone()));
        }
        if row.is_running() {
            return Err(OrchestratorError::SymbolRunning(row.symbol.clone()));
        }
        Ok(())
    }

    /// Apply `f` to the row an operation was issued for.
    ///
    /// Falls back to the trading pair when a save renamed the id while the
    /// request was in flight.
    fn with_row(&self, id: &SymbolId, symbol: &str, f: impl FnOnce(&mut Symbol)) {
        let mut registry = self.registry.write();
        let id = match registry.get(id) {
            Some(_) => id.clone(),
            None => match registry.find_by_symbol(symbol) {
                Some(row) => row.id.clone(),
                None => {
                    warn!(%id, %symbol, "Row disappeared while request was in flight");
                    return;
                }
            },
        };
        if let Some(row) = registry.get_mut(&id) {
            f(row);
        }
    }

    /// Publish the current state to subscribers.
    fn publish(&self) {
        let in_flight = self.operations.snapshot();
        let edit_session = self.edit.lock().is_active();
        let saving = self.is_saving();
        let registry = self.registry.read();
        let rows: Vec<SymbolView> = registry
            .rows()
            .iter()
            .map(|row| SymbolView::new(row, &in_flight))
            .collect();

        Metrics::operations_in_flight(in_flight.len());
        Metrics::symbols_running(registry.running_count());

        self.tx.send_replace(RegistrySnapshot {
            rows,
            edit_session,
            saving,
            in_flight,
            backend_running: *self.backend_running.read(),
            taken_at: chrono::Utc::now(),
        });
    }
}

/// Marks a save as in flight; cleared on drop, including when the save
/// future is dropped.
struct SaveGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SaveGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Await a backend call, recording its latency.
async fn timed<F: Future>(call: &'static str, fut: F) -> F::Output {
    let started = Instant::now();
    let output = fut.await;
    Metrics::backend_latency(call, started.elapsed().as_secs_f64() * 1000.0);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::StaticSelection;
    use gridctl_client::MockBackend;
    use gridctl_core::SymbolConfig;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn orchestrator(mock: &Arc<MockBackend>, exchanges: &[&str]) -> LifecycleOrchestrator {
        LifecycleOrchestrator::new(
            mock.clone(),
            Arc::new(StaticSelection::new(exchanges.iter().copied())),
        )
    }

    fn cfg(symbol: &str) -> SymbolConfig {
        SymbolConfig::new(symbol, dec!(2), dec!(1)).unwrap()
    }

    #[tokio::test]
    async fn test_publish_reflects_edit_session() {
        let mock = Arc::new(MockBackend::new());
        let orch = orchestrator(&mock, &["binance"]);
        let mut rx = orch.subscribe();

        let id = orch.add().unwrap();
        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert!(snapshot.edit_session);
        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(snapshot.rows[0].id, id);
    }

    #[tokio::test]
    async fn test_update_validates_percentages() {
        let mock = Arc::new(MockBackend::new());
        mock.set_configured(vec![cfg("BTCUSDT")]);
        let orch = orchestrator(&mock, &["binance"]);
        orch.load_configuration().await.unwrap();
        orch.enter_edit();

        let id = SymbolId::new("BTCUSDT");
        let err = orch.update(&id, "BTCUSDT", dec!(-1), dec!(1)).unwrap_err();
        assert!(matches!(err, OrchestratorError::Invalid(_)));
        assert_eq!(orch.get(&id).unwrap().take_profit_percent, dec!(2));
    }

    #[tokio::test]
    async fn test_load_refused_while_editing() {
        let mock = Arc::new(MockBackend::new());
        let orch = orchestrator(&mock, &["binance"]);
        orch.enter_edit();
        assert!(matches!(
            orch.load_configuration().await,
            Err(OrchestratorError::EditSessionActive)
        ));
        assert!(mock.calls().is_empty());
    }
}
