//! Backend-reported lifecycle status.

use crate::symbol::ExchangeId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Run state the backend reports for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Stopped,
}

/// Status entry for one symbol in the backend's active-symbols map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolStatusReport {
    pub status: RunStatus,
    #[serde(default)]
    pub exchanges: BTreeSet<ExchangeId>,
}

impl SymbolStatusReport {
    pub fn running<I>(exchanges: I) -> Self
    where
        I: IntoIterator<Item = ExchangeId>,
    {
        Self {
            status: RunStatus::Running,
            exchanges: exchanges.into_iter().collect(),
        }
    }

    pub fn stopped() -> Self {
        Self {
            status: RunStatus::Stopped,
            exchanges: BTreeSet::new(),
        }
    }
}

/// Authoritative snapshot keyed by symbol string.
pub type ActiveStatus = HashMap<String, SymbolStatusReport>;
