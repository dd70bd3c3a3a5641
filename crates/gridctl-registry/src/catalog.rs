//! Tradable symbol catalog.

use gridctl_core::normalize_symbol;
use std::collections::HashSet;

/// Trading pairs the backend can run, in backend order.
#[derive(Debug, Clone, Default)]
pub struct SymbolCatalog {
    symbols: Vec<String>,
}

impl SymbolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the catalog. Entries are normalized and de-duplicated.
    pub fn replace<I, S>(&mut self, symbols: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        self.symbols = symbols
            .into_iter()
            .map(|s| normalize_symbol(s.as_ref()))
            .filter(|s| !s.is_empty() && seen.insert(s.clone()))
            .collect();
    }

    /// Entries containing `term` (case-insensitive). An empty term matches
    /// nothing.
    pub fn search(&self, term: &str) -> Vec<&str> {
        let term = normalize_symbol(term);
        if term.is_empty() {
            return Vec::new();
        }
        self.symbols
            .iter()
            .filter(|s| s.contains(&term))
            .map(String::as_str)
            .collect()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        let wanted = normalize_symbol(symbol);
        self.symbols.iter().any(|s| *s == wanted)
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
