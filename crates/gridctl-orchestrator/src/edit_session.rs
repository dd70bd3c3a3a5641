//! Edit session.
//!
//! While active, structural edits are allowed and lifecycle actions are
//! refused. Entering captures the registry rows so a cancel can restore
//! them.

use std::collections::HashMap;

use gridctl_core::{Symbol, SymbolId};

#[derive(Debug, Default)]
pub struct EditSession {
    captured: Option<Vec<Symbol>>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.captured.is_some()
    }

    /// Enter the session, capturing `rows`. Returns false if already active.
    pub fn enter(&mut self, rows: &[Symbol]) -> bool {
        if self.is_active() {
            return false;
        }
        self.captured = Some(rows.to_vec());
        true
    }

    /// Leave the session keeping the edits. Returns false if not active.
    pub fn finish(&mut self) -> bool {
        self.captured.take().is_some()
    }

    /// Leave the session discarding the edits.
    ///
    /// Returns the rows to restore: the captured structural fields, with the
    /// lifecycle fields of `current` for rows still present. `None` if the
    /// session was not active.
    pub fn cancel(&mut self, current: &[Symbol]) -> Option<Vec<Symbol>> {
        let mut captured = self.captured.take()?;
        let live: HashMap<&SymbolId, &Symbol> = current.iter().map(|row| (&row.id, row)).collect();
        for row in &mut captured {
            if let Some(now) = live.get(&row.id) {
                row.set_exchanges(now.exchanges().clone());
            }
        }
        Some(captured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridctl_core::{ExchangeId, SymbolConfig};
    use rust_decimal_macros::dec;

    fn row(symbol: &str) -> Symbol {
        Symbol::from_config(SymbolConfig::new(symbol, dec!(2), dec!(1)).unwrap())
    }

    #[test]
    fn test_enter_is_idempotent() {
        let mut session = EditSession::new();
        assert!(session.enter(&[row("BTCUSDT")]));
        assert!(!session.enter(&[]));
        assert!(session.is_active());
        assert!(session.finish());
        assert!(!session.finish());
    }

    #[test]
    fn test_cancel_restores_structure_keeps_lifecycle() {
        let mut session = EditSession::new();
        let original = vec![row("BTCUSDT"), row("ETHUSDT")];
        session.enter(&original);

        let mut current = original.clone();
        current[0].take_profit_percent = dec!(9);
        current[0].add_exchange(ExchangeId::new("binance"));
        current.remove(1);
        current.push(Symbol::blank());

        let restored = session.cancel(&current).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored[0].take_profit_percent, dec!(2));
        assert!(restored[0].is_running_on(&ExchangeId::new("binance")));
        assert_eq!(restored[1].symbol, "ETHUSDT");
        assert!(!session.is_active());
        assert!(session.cancel(&current).is_none());
    }
}
