//! Status reconciliation.
//!
//! Merges the backend's active-symbols snapshot into the registry. Only
//! lifecycle fields are written, so an in-progress edit of symbol or TP/SL
//! is never clobbered. Applying the same snapshot twice is a no-op.

use crate::registry::SymbolRegistry;
use gridctl_core::{ActiveStatus, RunStatus};
use tracing::{debug, warn};

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Rows with an entry in the snapshot.
    pub matched: usize,
    /// Rows running after the pass.
    pub running: usize,
    /// Rows whose exchange set changed.
    pub changed: usize,
}

/// Apply `active` to every row of `registry`.
///
/// Rows without a matching entry, or whose entry is `stopped`, end up with
/// no exchanges. A `running` entry with an empty exchange list cannot be
/// represented and is treated as stopped.
pub fn reconcile(registry: &mut SymbolRegistry, active: &ActiveStatus) -> ReconcileSummary {
    let mut summary = ReconcileSummary::default();

    for row in registry.rows_mut() {
        let reported = match active.get(&row.symbol) {
            Some(report) => {
                summary.matched += 1;
                match report.status {
                    RunStatus::Running if report.exchanges.is_empty() => {
                        warn!(
                            symbol = %row.symbol,
                            "Backend reports running without exchanges, treating as stopped"
                        );
                        Default::default()
                    }
                    RunStatus::Running => report.exchanges.clone(),
                    RunStatus::Stopped => Default::default(),
                }
            }
            None => Default::default(),
        };

        if row.exchanges() != &reported {
            summary.changed += 1;
            debug!(
                symbol = %row.symbol,
                before = ?row.exchanges(),
                after = ?reported,
                "Lifecycle state reconciled"
            );
            row.set_exchanges(reported);
        }

        if row.is_running() {
            summary.running += 1;
        }
    }

    summary
}
