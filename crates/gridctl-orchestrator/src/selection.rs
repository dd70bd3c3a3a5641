//! Exchange-selection store.
//!
//! The operator chooses which exchanges a start fans out to. The
//! orchestrator only reads the selection, at start time.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gridctl_core::ExchangeId;
use tracing::{debug, warn};

use crate::error::{OrchestratorError, OrchestratorResult};

/// Read access to the operator's exchange selection.
pub trait ExchangeSelection: Send + Sync {
    /// Selected exchanges, in selection order, without duplicates.
    fn get(&self) -> Vec<ExchangeId>;
}

/// Arc wrapper for ExchangeSelection trait objects.
pub type DynSelection = Arc<dyn ExchangeSelection>;

/// Fixed selection.
#[derive(Debug, Clone, Default)]
pub struct StaticSelection {
    exchanges: Vec<ExchangeId>,
}

impl StaticSelection {
    pub fn new<I, S>(exchanges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            exchanges: dedup(exchanges.into_iter().map(ExchangeId::new)),
        }
    }
}

impl ExchangeSelection for StaticSelection {
    fn get(&self) -> Vec<ExchangeId> {
        self.exchanges.clone()
    }
}

/// Selection persisted as a JSON array of exchange names.
#[derive(Debug, Clone)]
pub struct SelectionFile {
    path: PathBuf,
}

impl SelectionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flip `exchange` in or out of the selection and persist it.
    ///
    /// Returns true if the exchange is selected afterwards.
    pub fn toggle(&self, exchange: &ExchangeId) -> OrchestratorResult<bool> {
        let mut selected = self.read()?;
        let now_selected = match selected.iter().position(|e| e == exchange) {
            Some(idx) => {
                selected.remove(idx);
                false
            }
            None => {
                selected.push(exchange.clone());
                true
            }
        };
        self.set(&selected)?;
        debug!(%exchange, selected = now_selected, "Exchange selection toggled");
        Ok(now_selected)
    }

    /// Overwrite the selection.
    pub fn set(&self, exchanges: &[ExchangeId]) -> OrchestratorResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| OrchestratorError::Selection(e.to_string()))?;
            }
        }
        let json = serde_json::to_string_pretty(&dedup(exchanges.iter().cloned()))
            .map_err(|e| OrchestratorError::Selection(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| OrchestratorError::Selection(e.to_string()))
    }

    /// Read the file. A missing file is an empty selection.
    fn read(&self) -> OrchestratorResult<Vec<ExchangeId>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(OrchestratorError::Selection(e.to_string())),
        };
        let names: Vec<String> = serde_json::from_str(&content).map_err(|e| {
            OrchestratorError::Selection(format!("{}: {e}", self.path.display()))
        })?;
        Ok(dedup(
            names
                .iter()
                .filter(|name| !name.trim().is_empty())
                .map(ExchangeId::new),
        ))
    }
}

impl ExchangeSelection for SelectionFile {
    fn get(&self) -> Vec<ExchangeId> {
        self.read().unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Unreadable exchange selection, treating as empty");
            Vec::new()
        })
    }
}

fn dedup(exchanges: impl Iterator<Item = ExchangeId>) -> Vec<ExchangeId> {
    let mut seen = HashSet::new();
    exchanges.filter(|e| seen.insert(e.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_static_selection_normalizes() {
        let selection = StaticSelection::new(["Binance", "kraken", "binance"]);
        assert_eq!(
            selection.get(),
            vec![ExchangeId::new("binance"), ExchangeId::new("kraken")]
        );
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = SelectionFile::new(dir.path().join("selected.json"));
        assert!(file.get().is_empty());
    }

    #[test]
    fn test_toggle_persists() {
        let dir = tempfile::tempdir().unwrap();
        let file = SelectionFile::new(dir.path().join("nested").join("selected.json"));

        assert!(file.toggle(&ExchangeId::new("binance")).unwrap());
        assert!(file.toggle(&ExchangeId::new("kraken")).unwrap());
        assert_eq!(
            file.get(),
            vec![ExchangeId::new("binance"), ExchangeId::new("kraken")]
        );

        assert!(!file.toggle(&ExchangeId::new("binance")).unwrap());
        assert_eq!(file.get(), vec![ExchangeId::new("kraken")]);

        let raw = std::fs::read_to_string(file.path()).unwrap();
        let names: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(names, vec!["kraken"]);

        assert_ok!(file.set(&[ExchangeId::new("bybit"), ExchangeId::new("bybit")]));
        assert_eq!(file.get(), vec![ExchangeId::new("bybit")]);
    }

    #[test]
    fn test_corrupt_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selected.json");
        std::fs::write(&path, "not json").unwrap();
        let file = SelectionFile::new(&path);
        assert!(file.get().is_empty());
        assert_err!(file.toggle(&ExchangeId::new("binance")));
    }
}
