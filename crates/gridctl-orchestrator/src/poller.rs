//! Periodic status reconciliation.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::orchestrator::LifecycleOrchestrator;

/// Re-fetches backend status on a fixed interval so local state converges
/// after drift (a bot crashing server-side, a start racing a stop).
///
/// Until a configuration or catalog load has succeeded, each pass retries
/// it before reconciling.
pub struct ReconcileLoop {
    orchestrator: Arc<LifecycleOrchestrator>,
    interval: Duration,
}

impl ReconcileLoop {
    pub fn new(orchestrator: Arc<LifecycleOrchestrator>, interval: Duration) -> Self {
        Self {
            orchestrator,
            interval,
        }
    }

    /// Run until `shutdown` is cancelled. The first pass happens
    /// immediately; missed ticks are skipped.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(interval_ms = self.interval.as_millis() as u64, "Reconcile loop started");

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    info!("Reconcile loop stopped");
                    return;
                }
                _ = ticker.tick() => self.pass().await,
            }
        }
    }

    async fn pass(&self) {
        if !self.orchestrator.is_configuration_loaded() {
            match self.orchestrator.load_configuration().await {
                Ok(outcome) => debug!(ok = outcome.is_ok(), "Configuration load retried"),
                Err(e) => debug!(error = %e, "Configuration load skipped"),
            }
        }
        if !self.orchestrator.is_catalog_loaded() {
            let outcome = self.orchestrator.load_catalog().await;
            debug!(ok = outcome.is_ok(), "Catalog load retried");
        }
        let outcome = self.orchestrator.refresh_status().await;
        debug!(ok = outcome.is_ok(), "Reconcile pass finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::StaticSelection;
    use gridctl_client::{BackendCall, MockBackend};
    use gridctl_core::SymbolConfig;
    use rust_decimal_macros::dec;

    #[tokio::test(start_paused = true)]
    async fn test_loop_reconciles_until_cancelled() {
        let mock = Arc::new(MockBackend::new());
        mock.set_configured(vec![SymbolConfig::new("BTCUSDT", dec!(2), dec!(1)).unwrap()]);
        let orch = Arc::new(LifecycleOrchestrator::new(
            mock.clone(),
            Arc::new(StaticSelection::new(["binance"])),
        ));
        orch.load_configuration().await.unwrap();

        let shutdown = CancellationToken::new();
        let task = tokio::spawn(
            ReconcileLoop::new(orch.clone(), Duration::from_secs(30)).run(shutdown.clone()),
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        mock.set_running("BTCUSDT", &["kraken"]);
        tokio::time::sleep(Duration::from_secs(30)).await;

        let snapshot = orch.snapshot();
        assert!(snapshot.row("BTCUSDT").unwrap().running);
        assert!(mock.count_calls(|c| *c == BackendCall::FetchStatus) >= 2);

        shutdown.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_recovers_from_failed_initial_load() {
        let mock = Arc::new(MockBackend::new());
        mock.set_configured(vec![SymbolConfig::new("BTCUSDT", dec!(2), dec!(1)).unwrap()]);
        mock.set_tradable(vec!["BTCUSDT".to_string()]);
        mock.set_running("BTCUSDT", &["binance"]);
        mock.set_fail_list(true);
        let orch = Arc::new(LifecycleOrchestrator::new(
            mock.clone(),
            Arc::new(StaticSelection::new(["binance"])),
        ));
        assert!(!orch.initialize().await.unwrap().is_ok());
        assert!(!orch.is_configuration_loaded());

        let shutdown = CancellationToken::new();
        let task = tokio::spawn(
            ReconcileLoop::new(orch.clone(), Duration::from_secs(30)).run(shutdown.clone()),
        );

        // Backend still down on the first pass
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(orch.snapshot().rows.is_empty());

        mock.set_fail_list(false);
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert!(orch.is_configuration_loaded());
        assert!(orch.is_tradable("BTCUSDT"));
        let snapshot = orch.snapshot();
        assert_eq!(snapshot.rows.len(), 1);
        assert!(snapshot.row("BTCUSDT").unwrap().running);

        // Loaded state is not reloaded on later passes
        mock.clear_calls();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(
            mock.count_calls(|c| *c == BackendCall::ListConfiguredSymbols),
            0
        );

        shutdown.cancel();
        task.await.unwrap();
    }
}
