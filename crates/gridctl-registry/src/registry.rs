//! Ordered in-memory collection of configured symbols.
//!
//! Rows keep insertion order for display. Nothing here performs I/O and no
//! operation can fail: unknown ids are no-ops.

use gridctl_core::{normalize_symbol, Symbol, SymbolConfig, SymbolId};
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Symbol registry.
#[derive(Debug, Clone, Default)]
pub struct SymbolRegistry {
    rows: Vec<Symbol>,
}

impl SymbolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every row from a backend configuration listing.
    ///
    /// Lifecycle fields start empty and must be reconciled afterwards.
    /// Repeated symbols keep their first occurrence.
    pub fn load<I>(&mut self, configs: I)
    where
        I: IntoIterator<Item = SymbolConfig>,
    {
        let mut seen = HashSet::new();
        self.rows = configs
            .into_iter()
            .filter(|cfg| {
                let fresh = seen.insert(cfg.symbol.clone());
                if !fresh {
                    warn!(symbol = %cfg.symbol, "Duplicate symbol in configuration, keeping first");
                }
                fresh
            })
            .map(Symbol::from_config)
            .collect();
        debug!(rows = self.rows.len(), "Symbol registry loaded");
    }

    /// Append a blank row with a placeholder id and default TP/SL.
    pub fn add(&mut self) -> SymbolId {
        let row = Symbol::blank();
        let id = row.id.clone();
        self.rows.push(row);
        id
    }

    /// Delete a row. Returns the removed row, if any.
    pub fn remove(&mut self, id: &SymbolId) -> Option<Symbol> {
        let idx = self.rows.iter().position(|row| &row.id == id)?;
        Some(self.rows.remove(idx))
    }

    /// Overwrite the structural fields of a row.
    ///
    /// The symbol string is normalized. Returns false if `id` is unknown.
    pub fn update(
        &mut self,
        id: &SymbolId,
        symbol: &str,
        take_profit_percent: Decimal,
        stop_loss_percent: Decimal,
    ) -> bool {
        match self.get_mut(id) {
            Some(row) => {
                row.symbol = normalize_symbol(symbol);
                row.take_profit_percent = take_profit_percent;
                row.stop_loss_percent = stop_loss_percent;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &SymbolId) -> Option<&Symbol> {
        self.rows.iter().find(|row| &row.id == id)
    }

    pub fn get_mut(&mut self, id: &SymbolId) -> Option<&mut Symbol> {
        self.rows.iter_mut().find(|row| &row.id == id)
    }

    /// First row whose trading pair matches `symbol` (normalized).
    pub fn find_by_symbol(&self, symbol: &str) -> Option<&Symbol> {
        let wanted = normalize_symbol(symbol);
        self.rows.iter().find(|row| row.symbol == wanted)
    }

    pub fn rows(&self) -> &[Symbol] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> impl Iterator<Item = &mut Symbol> {
        self.rows.iter_mut()
    }

    /// Replace all rows as-is (used to restore a captured copy).
    pub fn replace_rows(&mut self, rows: Vec<Symbol>) {
        self.rows = rows;
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn running_count(&self) -> usize {
        self.rows.iter().filter(|row| row.is_running()).count()
    }

    /// Configuration to persist: non-blank rows, first occurrence of each
    /// symbol wins.
    pub fn persistable_configs(&self) -> Vec<SymbolConfig> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter_map(Symbol::to_config)
            .filter(|cfg| seen.insert(cfg.symbol.clone()))
            .collect()
    }

    /// Align rows with a configuration the backend just accepted.
    ///
    /// Rows that were not part of `saved` (blank or duplicate) are dropped
    /// and every remaining row's id becomes its symbol string.
    pub fn commit_saved(&mut self, saved: &[SymbolConfig]) {
        let mut pending: HashSet<&str> = saved.iter().map(|cfg| cfg.symbol.as_str()).collect();
        let before = self.rows.len();
        self.rows.retain_mut(|row| {
            if !pending.remove(row.symbol.as_str()) {
                return false;
            }
            row.id = SymbolId::new(row.symbol.clone());
            true
        });
        let dropped = before - self.rows.len();
        if dropped > 0 {
            debug!(dropped, "Dropped rows not included in saved configuration");
        }
    }
}
