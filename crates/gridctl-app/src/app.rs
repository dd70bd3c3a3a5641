//! Application wiring and CLI command handlers.

use std::fmt::Write as _;
use std::sync::Arc;

use gridctl_client::{DynBackend, HttpBackend};
use gridctl_core::{ExchangeId, SymbolId};
use gridctl_orchestrator::{
    ExchangeSelection, LifecycleOrchestrator, ReconcileLoop, RegistrySnapshot, SaveOutcome,
    SelectionFile, StartOutcome, StopOutcome, SyncOutcome,
};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cli::{Command, ExchangesCommand};
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// Main application.
pub struct Application {
    config: AppConfig,
    orchestrator: Arc<LifecycleOrchestrator>,
    selection: Arc<SelectionFile>,
}

impl Application {
    /// Create an application talking to the configured HTTP backend.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let backend = HttpBackend::new(config.api_url.clone(), config.request_timeout())?;
        Ok(Self::with_backend(config, Arc::new(backend)))
    }

    /// Create an application over any backend.
    pub fn with_backend(config: AppConfig, backend: DynBackend) -> Self {
        let selection = Arc::new(SelectionFile::new(config.selection_file.clone()));
        let orchestrator = Arc::new(LifecycleOrchestrator::new(backend, selection.clone()));
        Self {
            config,
            orchestrator,
            selection,
        }
    }

    pub fn orchestrator(&self) -> &Arc<LifecycleOrchestrator> {
        &self.orchestrator
    }

    /// Run one command. Returns the text to print.
    pub async fn run(&self, command: Command) -> AppResult<String> {
        match command {
            Command::Status => self.status().await,
            Command::Start { symbol } => self.start(&symbol).await,
            Command::Stop { symbol, exchange } => self.stop(&symbol, exchange.as_deref()).await,
            Command::Search { term } => self.search(&term).await,
            Command::Exchanges { action } => match action.unwrap_or(ExchangesCommand::List) {
                ExchangesCommand::List => Ok(self.list_exchanges()),
                ExchangesCommand::Toggle { exchange } => self.toggle_exchange(&exchange),
            },
            Command::Set { symbol, tp, sl } => self.set(&symbol, tp, sl).await,
            Command::Remove { symbol } => self.remove(&symbol).await,
            Command::Serve => self.serve().await.map(|()| String::new()),
            Command::Config => self.config.to_toml(),
        }
    }

    /// Load configuration, catalog and live status from the backend.
    async fn sync(&self) -> AppResult<()> {
        match self.orchestrator.initialize().await? {
            SyncOutcome::Failed { reason } => Err(AppError::Command(format!(
                "backend unavailable at {}: {reason}",
                self.config.api_url
            ))),
            _ => Ok(()),
        }
    }

    async fn status(&self) -> AppResult<String> {
        self.sync().await?;
        Ok(render_status(&self.orchestrator.snapshot()))
    }

    async fn start(&self, symbol: &str) -> AppResult<String> {
        self.sync().await?;
        let id = self.row_id(symbol)?;

        match self.orchestrator.start(&id).await? {
            StartOutcome::AlreadyInFlight => Ok(format!("{symbol}: start already in progress")),
            StartOutcome::Completed { started, failed } => {
                let mut out = String::new();
                for exchange in &started {
                    let _ = writeln!(out, "{} started on {exchange}", id);
                }
                for (exchange, reason) in &failed {
                    let _ = writeln!(out, "{} failed on {exchange}: {reason}", id);
                }
                if started.is_empty() {
                    return Err(AppError::Command(out.trim_end().to_string()));
                }
                Ok(out.trim_end().to_string())
            }
        }
    }

    async fn stop(&self, symbol: &str, exchange: Option<&str>) -> AppResult<String> {
        self.sync().await?;
        let id = self.row_id(symbol)?;
        let exchange = exchange.map(ExchangeId::new);
        let scope = exchange
            .as_ref()
            .map_or_else(|| "all exchanges".to_string(), ToString::to_string);

        match self.orchestrator.stop(&id, exchange).await? {
            StopOutcome::AlreadyInFlight => Ok(format!("{id}: stop already in progress")),
            StopOutcome::Stopped => Ok(format!("{id} stopped on {scope}")),
            StopOutcome::Failed { reason } => Err(AppError::Command(format!(
                "{id}: stop on {scope} failed: {reason}"
            ))),
        }
    }

    async fn search(&self, term: &str) -> AppResult<String> {
        if let SyncOutcome::Failed { reason } = self.orchestrator.load_catalog().await {
            return Err(AppError::Command(format!("cannot list tradable symbols: {reason}")));
        }
        let matches = self.orchestrator.search_tradable(term);
        if matches.is_empty() {
            return Ok(format!("no tradable symbol matches {term:?}"));
        }
        Ok(matches.join("\n"))
    }

    fn list_exchanges(&self) -> String {
        let selected = self.selection.get();
        self.config
            .supported_exchanges
            .iter()
            .map(|name| {
                let mark = if selected.contains(&ExchangeId::new(name)) {
                    "[x]"
                } else {
                    "[ ]"
                };
                format!("{mark} {name}")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn toggle_exchange(&self, exchange: &str) -> AppResult<String> {
        if !self.config.is_supported(exchange) {
            return Err(AppError::Command(format!(
                "unsupported exchange {exchange:?} (supported: {})",
                self.config.supported_exchanges.join(", ")
            )));
        }
        let exchange = ExchangeId::new(exchange);
        let selected = self.selection.toggle(&exchange)?;
        Ok(format!(
            "{exchange} {}",
            if selected { "selected" } else { "deselected" }
        ))
    }

    /// Upsert a row and persist the configuration.
    async fn set(&self, symbol: &str, tp: Decimal, sl: Decimal) -> AppResult<String> {
        self.sync().await?;
        if !self.orchestrator.is_tradable(symbol) {
            warn!(symbol, "Symbol not in the tradable catalog");
        }

        let id = match self.orchestrator.find_id(symbol) {
            Some(id) => {
                self.orchestrator.enter_edit();
                id
            }
            None => self.orchestrator.add()?,
        };
        if let Err(e) = self.orchestrator.update(&id, symbol, tp, sl) {
            self.orchestrator.cancel_edit();
            return Err(e.into());
        }
        self.save().await
    }

    /// Drop a stopped row and persist the configuration.
    async fn remove(&self, symbol: &str) -> AppResult<String> {
        self.sync().await?;
        let id = self.row_id(symbol)?;

        self.orchestrator.enter_edit();
        if let Err(e) = self.orchestrator.remove(&id) {
            self.orchestrator.cancel_edit();
            return Err(e.into());
        }
        self.save().await
    }

    async fn save(&self) -> AppResult<String> {
        match self.orchestrator.save().await {
            SaveOutcome::Saved { symbols } => Ok(format!("saved {symbols} symbol(s)")),
            SaveOutcome::AlreadyInFlight => Err(AppError::Command("save already in flight".to_string())),
            SaveOutcome::Failed { reason } => {
                self.orchestrator.cancel_edit();
                Err(AppError::Command(format!("save failed: {reason}")))
            }
        }
    }

    /// Reconcile periodically and serve the dashboard until Ctrl-C.
    async fn serve(&self) -> AppResult<()> {
        if let Err(e) = self.sync().await {
            // The reconcile loop retries the load until it succeeds
            warn!(error = %e, "Initial sync failed");
        }

        let shutdown = CancellationToken::new();
        let mut tasks = Vec::new();

        if let Some(interval) = self.config.reconcile_interval() {
            let reconcile = ReconcileLoop::new(self.orchestrator.clone(), interval);
            tasks.push(tokio::spawn(reconcile.run(shutdown.clone())));
        } else {
            info!("Periodic reconciliation disabled");
        }

        if self.config.dashboard.enabled {
            let orchestrator = self.orchestrator.clone();
            let config = self.config.dashboard.clone();
            let token = shutdown.clone();
            tasks.push(tokio::spawn(async move {
                if let Err(e) = gridctl_dashboard::run_server(orchestrator, config, token).await {
                    error!(error = %e, "Dashboard server failed");
                }
            }));
        }

        info!("gridctl serving, press Ctrl-C to stop");
        tokio::signal::ctrl_c().await?;
        info!("Shutdown requested");
        shutdown.cancel();

        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Task ended abnormally");
            }
        }
        Ok(())
    }

    fn row_id(&self, symbol: &str) -> AppResult<SymbolId> {
        self.orchestrator
            .find_id(symbol)
            .ok_or_else(|| AppError::Command(format!("symbol {symbol:?} is not configured")))
    }
}

/// Table of rows for `gridctl status`.
pub fn render_status(snapshot: &RegistrySnapshot) -> String {
    let mut out = String::new();
    let backend = match snapshot.backend_running {
        Some(true) => "running",
        Some(false) => "stopped",
        None => "unknown",
    };
    let _ = writeln!(out, "backend: {backend}");
    if snapshot.rows.is_empty() {
        out.push_str("no symbols configured");
        return out;
    }

    let _ = writeln!(out, "{:<12} {:>6} {:>6}  {:<8} EXCHANGES", "SYMBOL", "TP%", "SL%", "STATE");
    for row in &snapshot.rows {
        let state = match row.pending {
            Some(status) => status.as_str(),
            None if row.running => "running",
            None => "stopped",
        };
        let exchanges = row
            .exchanges
            .iter()
            .map(ExchangeId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let _ = writeln!(
            out,
            "{:<12} {:>6} {:>6}  {:<8} {}",
            row.symbol,
            row.take_profit_percent.normalize(),
            row.stop_loss_percent.normalize(),
            state,
            if exchanges.is_empty() { "-" } else { &exchanges }
        );
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridctl_client::{BackendCall, MockBackend};
    use gridctl_core::SymbolConfig;
    use rust_decimal_macros::dec;

    fn app(dir: &tempfile::TempDir, mock: &Arc<MockBackend>) -> Application {
        let config = AppConfig {
            selection_file: dir.path().join("selected.json"),
            ..Default::default()
        };
        Application::with_backend(config, mock.clone())
    }

    fn mock_with(symbols: &[&str]) -> Arc<MockBackend> {
        let mock = Arc::new(MockBackend::new());
        mock.set_configured(
            symbols
                .iter()
                .map(|s| SymbolConfig::new(s, dec!(2), dec!(1)).unwrap())
                .collect(),
        );
        mock.set_tradable(vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()]);
        mock
    }

    #[tokio::test]
    async fn test_start_uses_selection_file() {
        let dir = tempfile::tempdir().unwrap();
        let mock = mock_with(&["BTCUSDT"]);
        let app = app(&dir, &mock);

        let err = app
            .run(Command::Start {
                symbol: "btcusdt".to_string(),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No exchange selected"));

        app.run(Command::Exchanges {
            action: Some(ExchangesCommand::Toggle {
                exchange: "Kraken".to_string(),
            }),
        })
        .await
        .unwrap();
        let out = app
            .run(Command::Start {
                symbol: "BTCUSDT".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(out, "BTCUSDT started on kraken");
    }

    #[tokio::test]
    async fn test_toggle_rejects_unsupported_exchange() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, &mock_with(&[]));
        let err = app
            .run(Command::Exchanges {
                action: Some(ExchangesCommand::Toggle {
                    exchange: "ftx".to_string(),
                }),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Command(_)));

        let listing = app.run(Command::Exchanges { action: None }).await.unwrap();
        assert_eq!(listing, "[ ] binance\n[ ] bybit\n[ ] kraken");
    }

    #[tokio::test]
    async fn test_set_adds_then_updates_row() {
        let dir = tempfile::tempdir().unwrap();
        let mock = mock_with(&["BTCUSDT"]);
        let app = app(&dir, &mock);

        app.run(Command::Set {
            symbol: "ethusdt".to_string(),
            tp: dec!(3),
            sl: dec!(1.5),
        })
        .await
        .unwrap();
        app.run(Command::Set {
            symbol: "BTCUSDT".to_string(),
            tp: dec!(4),
            sl: dec!(2),
        })
        .await
        .unwrap();

        assert_eq!(
            mock.configured(),
            vec![
                SymbolConfig::new("BTCUSDT", dec!(4), dec!(2)).unwrap(),
                SymbolConfig::new("ETHUSDT", dec!(3), dec!(1.5)).unwrap(),
            ]
        );
        assert!(!app.orchestrator().is_editing());
    }

    #[tokio::test]
    async fn test_remove_running_symbol_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mock = mock_with(&["BTCUSDT", "ETHUSDT"]);
        mock.set_running("BTCUSDT", &["binance"]);
        let app = app(&dir, &mock);

        let err = app
            .run(Command::Remove {
                symbol: "BTCUSDT".to_string(),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("running"));
        assert!(!app.orchestrator().is_editing());
        assert_eq!(
            mock.count_calls(|c| matches!(c, BackendCall::ReplaceSymbols(_))),
            0
        );

        app.run(Command::Remove {
            symbol: "ETHUSDT".to_string(),
        })
        .await
        .unwrap();
        assert_eq!(mock.configured().len(), 1);
    }

    #[tokio::test]
    async fn test_stop_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let mock = mock_with(&["BTCUSDT", "ETHUSDT"]);
        mock.set_running("BTCUSDT", &["binance", "kraken"]);
        let app = app(&dir, &mock);

        let out = app
            .run(Command::Stop {
                symbol: "BTCUSDT".to_string(),
                exchange: Some("binance".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(out, "BTCUSDT stopped on binance");

        let status = app.run(Command::Status).await.unwrap();
        assert!(status.contains("BTCUSDT"));
        assert!(status.contains("kraken"));
        assert!(!status.contains("binance"));
        assert!(status.lines().any(|l| l.starts_with("ETHUSDT") && l.contains("stopped")));
    }

    #[tokio::test]
    async fn test_unknown_symbol_and_search() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, &mock_with(&[]));

        let err = app
            .run(Command::Stop {
                symbol: "SOLUSDT".to_string(),
                exchange: None,
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not configured"));

        let out = app
            .run(Command::Search {
                term: "eth".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(out, "ETHUSDT");
    }

    #[tokio::test]
    async fn test_backend_down_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mock = mock_with(&["BTCUSDT"]);
        mock.set_fail_list(true);
        let app = app(&dir, &mock);

        let err = app.run(Command::Status).await.unwrap_err();
        assert!(err.to_string().contains("backend unavailable"));
    }

    #[test]
    fn test_render_empty_status() {
        let out = render_status(&RegistrySnapshot::default());
        assert_eq!(out, "backend: unknown\nno symbols configured");
    }
}
