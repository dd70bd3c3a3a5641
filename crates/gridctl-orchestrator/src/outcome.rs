//! Results of operations that talk to the backend.

use gridctl_core::ExchangeId;
use gridctl_registry::ReconcileSummary;

/// Result of `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// A start of this symbol was already in flight; nothing was sent.
    AlreadyInFlight,
    /// Every per-exchange request settled.
    Completed {
        started: Vec<ExchangeId>,
        /// Exchanges whose request failed, with the failure reason.
        failed: Vec<(ExchangeId, String)>,
    },
}

impl StartOutcome {
    /// True if at least one exchange accepted the start.
    pub fn any_started(&self) -> bool {
        matches!(self, Self::Completed { started, .. } if !started.is_empty())
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::AlreadyInFlight => "in_flight",
            Self::Completed { failed, .. } if failed.is_empty() => "ok",
            Self::Completed { started, .. } if started.is_empty() => "failed",
            Self::Completed { .. } => "partial",
        }
    }
}

/// Result of `stop`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// The same stop was already in flight; nothing was sent.
    AlreadyInFlight,
    Stopped,
    Failed { reason: String },
}

impl StopOutcome {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::AlreadyInFlight => "in_flight",
            Self::Stopped => "ok",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Result of `save`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Another save was in flight; nothing was sent.
    AlreadyInFlight,
    /// The backend accepted a configuration of `symbols` entries.
    Saved { symbols: usize },
    Failed { reason: String },
}

impl SaveOutcome {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::AlreadyInFlight => "in_flight",
            Self::Saved { .. } => "ok",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Result of a pull from the backend (configuration, catalog or status).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Configuration or catalog replaced with `rows` entries.
    Loaded { rows: usize },
    Reconciled(ReconcileSummary),
    Failed { reason: String },
}

impl SyncOutcome {
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}
