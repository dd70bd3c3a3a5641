//! Symbol and exchange identification types.
//!
//! A `Symbol` is one row of the operator's configuration: a trading pair
//! with take-profit/stop-loss percentages plus the set of exchanges the
//! backend currently reports it running on.

use crate::error::{CoreError, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Take-profit percentage given to newly added rows.
pub const DEFAULT_TAKE_PROFIT_PERCENT: Decimal = dec!(2.0);

/// Stop-loss percentage given to newly added rows.
pub const DEFAULT_STOP_LOSS_PERCENT: Decimal = dec!(1.0);

/// Prefix of ids handed out to rows that were never saved.
const PLACEHOLDER_PREFIX: &str = "new-";

/// Disambiguates placeholders created within the same millisecond.
static PLACEHOLDER_SEQ: AtomicU64 = AtomicU64::new(0);

/// Normalize an operator-typed trading pair ("btcusdt " -> "BTCUSDT").
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Row identifier.
///
/// Equal to the symbol string once the row has been persisted; a
/// timestamp-derived placeholder (`new-<millis>-<seq>`) before that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(String);

impl SymbolId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh placeholder for a row that has not been saved yet.
    pub fn placeholder() -> Self {
        let seq = PLACEHOLDER_SEQ.fetch_add(1, Ordering::Relaxed);
        Self(format!(
            "{PLACEHOLDER_PREFIX}{}-{seq}",
            Utc::now().timestamp_millis()
        ))
    }

    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with(PLACEHOLDER_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SymbolId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Exchange (trading venue) identifier, stored lower-case ("binance").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeId(String);

impl ExchangeId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ExchangeId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Err(CoreError::InvalidExchange("empty exchange name".to_string()));
        }
        Ok(Self::new(s))
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExchangeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Persisted configuration triple for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolConfig {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub take_profit_percent: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub stop_loss_percent: Decimal,
}

impl SymbolConfig {
    /// Build a validated config. The symbol is normalized; percentages
    /// must not be negative.
    pub fn new(symbol: &str, take_profit_percent: Decimal, stop_loss_percent: Decimal) -> Result<Self> {
        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return Err(CoreError::InvalidSymbol("empty symbol".to_string()));
        }
        for (name, value) in [("tp", take_profit_percent), ("sl", stop_loss_percent)] {
            if value.is_sign_negative() {
                return Err(CoreError::InvalidPercent(format!("{name} must be >= 0, got {value}")));
            }
        }
        Ok(Self {
            symbol,
            take_profit_percent,
            stop_loss_percent,
        })
    }
}

/// One configured trading pair.
///
/// The running flag is derived from `exchanges`; there is no way to set it
/// independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    /// Trading pair, e.g. "BTCUSDT". Empty for a freshly added row.
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub take_profit_percent: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub stop_loss_percent: Decimal,
    /// Exchanges the backend reports this symbol running on.
    exchanges: BTreeSet<ExchangeId>,
}

impl Symbol {
    /// Row loaded from persisted configuration; id equals the symbol.
    pub fn from_config(config: SymbolConfig) -> Self {
        Self {
            id: SymbolId::new(config.symbol.clone()),
            symbol: config.symbol,
            take_profit_percent: config.take_profit_percent,
            stop_loss_percent: config.stop_loss_percent,
            exchanges: BTreeSet::new(),
        }
    }

    /// Blank row with a placeholder id and default TP/SL.
    pub fn blank() -> Self {
        Self {
            id: SymbolId::placeholder(),
            symbol: String::new(),
            take_profit_percent: DEFAULT_TAKE_PROFIT_PERCENT,
            stop_loss_percent: DEFAULT_STOP_LOSS_PERCENT,
            exchanges: BTreeSet::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        !self.exchanges.is_empty()
    }

    pub fn is_blank(&self) -> bool {
        self.symbol.trim().is_empty()
    }

    pub fn exchanges(&self) -> &BTreeSet<ExchangeId> {
        &self.exchanges
    }

    pub fn is_running_on(&self, exchange: &ExchangeId) -> bool {
        self.exchanges.contains(exchange)
    }

    pub fn set_exchanges(&mut self, exchanges: BTreeSet<ExchangeId>) {
        self.exchanges = exchanges;
    }

    pub fn add_exchange(&mut self, exchange: ExchangeId) {
        self.exchanges.insert(exchange);
    }

    /// Returns true if the exchange was present.
    pub fn remove_exchange(&mut self, exchange: &ExchangeId) -> bool {
        self.exchanges.remove(exchange)
    }

    pub fn clear_exchanges(&mut self) {
        self.exchanges.clear();
    }

    /// Persisted triple for this row, or `None` for a blank row.
    pub fn to_config(&self) -> Option<SymbolConfig> {
        if self.is_blank() {
            return None;
        }
        Some(SymbolConfig {
            symbol: self.symbol.clone(),
            take_profit_percent: self.take_profit_percent,
            stop_loss_percent: self.stop_loss_percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_ids_are_unique() {
        let a = SymbolId::placeholder();
        let b = SymbolId::placeholder();
        assert_ne!(a, b);
        assert!(a.is_placeholder());
        assert!(!SymbolId::new("BTCUSDT").is_placeholder());
    }

    #[test]
    fn test_exchange_id_normalized() {
        assert_eq!(ExchangeId::new(" Binance ").as_str(), "binance");
        assert!("".parse::<ExchangeId>().is_err());
        assert_eq!("KRAKEN".parse::<ExchangeId>().unwrap().as_str(), "kraken");
    }

    #[test]
    fn test_running_follows_exchanges() {
        let mut sym = Symbol::from_config(SymbolConfig::new("btcusdt", dec!(2), dec!(1)).unwrap());
        assert_eq!(sym.id.as_str(), "BTCUSDT");
        assert!(!sym.is_running());

        sym.add_exchange(ExchangeId::new("binance"));
        sym.add_exchange(ExchangeId::new("kraken"));
        assert!(sym.is_running());

        assert!(sym.remove_exchange(&ExchangeId::new("binance")));
        assert!(sym.is_running());

        sym.clear_exchanges();
        assert!(!sym.is_running());
    }

    #[test]
    fn test_blank_row_defaults() {
        let row = Symbol::blank();
        assert!(row.is_blank());
        assert!(row.id.is_placeholder());
        assert_eq!(row.take_profit_percent, dec!(2.0));
        assert_eq!(row.stop_loss_percent, dec!(1.0));
        assert!(row.to_config().is_none());
    }

    #[test]
    fn test_symbol_config_validation() {
        assert!(SymbolConfig::new("  ", dec!(1), dec!(1)).is_err());
        assert!(SymbolConfig::new("ETHUSDT", dec!(-1), dec!(1)).is_err());
        let cfg = SymbolConfig::new("ethusdt", dec!(1.5), dec!(0.5)).unwrap();
        assert_eq!(cfg.symbol, "ETHUSDT");
    }

    #[test]
    fn test_symbol_config_json_uses_numbers() {
        let cfg = SymbolConfig::new("ETHUSDT", dec!(1.5), dec!(0.5)).unwrap();
        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(json["take_profit_percent"], serde_json::json!(1.5));
    }
}
