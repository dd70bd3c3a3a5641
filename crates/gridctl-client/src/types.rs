//! Wire types of the backend REST surface.
//!
//! | Call | Method | Path |
//! |---|---|---|
//! | list configured symbols | GET | `/symbols/` |
//! | list tradable symbols | GET | `/list/symbols/` |
//! | replace symbol configuration | POST | `/symbols/` |
//! | fetch lifecycle status | GET | `/grid-bot/status` |
//! | start symbol on exchange | POST | `/grid-bot/start-symbol` |
//! | stop symbol (optionally scoped) | POST | `/stop_symbol` |

use gridctl_core::{
    ActiveStatus, ExchangeId, RunStatus, SymbolConfig, DEFAULT_STOP_LOSS_PERCENT,
    DEFAULT_TAKE_PROFIT_PERCENT,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Response of `GET /symbols/`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfiguredSymbolsResponse {
    #[serde(default)]
    pub symbols: Vec<ConfiguredSymbolEntry>,
}

/// One stored symbol with its per-exchange configs.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfiguredSymbolEntry {
    pub symbol: String,
    #[serde(default)]
    pub configs: Vec<StoredConfig>,
}

/// Stored TP/SL pair.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(with = "rust_decimal::serde::float")]
    pub tp_percent: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub sl_percent: Decimal,
}

impl ConfiguredSymbolEntry {
    /// Domain config from the first stored config, or defaults if none.
    ///
    /// Returns `None` for entries with a blank symbol.
    pub fn to_config(&self) -> Option<SymbolConfig> {
        let (tp, sl) = self
            .configs
            .first()
            .map(|c| (c.tp_percent, c.sl_percent))
            .unwrap_or((DEFAULT_TAKE_PROFIT_PERCENT, DEFAULT_STOP_LOSS_PERCENT));
        SymbolConfig::new(&self.symbol, tp, sl).ok()
    }
}

/// Response of `GET /list/symbols/`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TradableSymbolsResponse {
    #[serde(default)]
    pub symbols: Vec<String>,
}

/// Body of `POST /symbols/`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplaceSymbolsRequest {
    pub symbols: Vec<SymbolUpdate>,
}

/// One entry of a configuration replace.
#[derive(Debug, Serialize, Deserialize)]
pub struct SymbolUpdate {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub tp_percent: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub sl_percent: Decimal,
}

impl From<&SymbolConfig> for SymbolUpdate {
    fn from(cfg: &SymbolConfig) -> Self {
        Self {
            symbol: cfg.symbol.clone(),
            tp_percent: cfg.take_profit_percent,
            sl_percent: cfg.stop_loss_percent,
        }
    }
}

/// Response of `GET /grid-bot/status`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub global_status: Option<RunStatus>,
    #[serde(default)]
    pub active_symbols: ActiveStatus,
}

/// Body of `POST /grid-bot/start-symbol`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StartSymbolRequest {
    pub exchange: ExchangeId,
    pub symbol: String,
}

/// Body of `POST /stop_symbol`. No exchange means every exchange.
#[derive(Debug, Serialize, Deserialize)]
pub struct StopSymbolRequest {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<ExchangeId>,
}

/// Lifecycle status as seen by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendStatus {
    /// Global bot status, when the backend reports one.
    pub running: Option<bool>,
    /// Per-symbol status.
    pub active: ActiveStatus,
}

impl From<StatusResponse> for BackendStatus {
    fn from(resp: StatusResponse) -> Self {
        Self {
            running: resp.global_status.map(|s| s == RunStatus::Running),
            active: resp.active_symbols,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_configured_symbols_use_first_config_or_defaults() {
        let json = r#"{"symbols":[
            {"symbol":"BTCUSDT","configs":[{"tp_percent":3.5,"sl_percent":1.25},{"tp_percent":9,"sl_percent":9}]},
            {"symbol":"ETHUSDT","configs":[]},
            {"symbol":"","configs":[]}
        ]}"#;
        let resp: ConfiguredSymbolsResponse = serde_json::from_str(json).unwrap();
        let configs: Vec<SymbolConfig> = resp.symbols.iter().filter_map(|e| e.to_config()).collect();

        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0].take_profit_percent, dec!(3.5));
        assert_eq!(configs[0].stop_loss_percent, dec!(1.25));
        assert_eq!(configs[1].take_profit_percent, dec!(2.0));
        assert_eq!(configs[1].stop_loss_percent, dec!(1.0));
    }

    #[test]
    fn test_stop_request_omits_missing_exchange() {
        let all = StopSymbolRequest {
            symbol: "BTCUSDT".to_string(),
            exchange: None,
        };
        assert_eq!(serde_json::to_string(&all).unwrap(), r#"{"symbol":"BTCUSDT"}"#);

        let one = StopSymbolRequest {
            symbol: "BTCUSDT".to_string(),
            exchange: Some(ExchangeId::new("binance")),
        };
        assert_eq!(
            serde_json::to_string(&one).unwrap(),
            r#"{"symbol":"BTCUSDT","exchange":"binance"}"#
        );
    }

    #[test]
    fn test_status_response_parsing() {
        let json = r#"{
            "global_status":"running",
            "active_symbols":{"BTCUSDT":{"status":"running","exchanges":["binance"]}}
        }"#;
        let status: BackendStatus = serde_json::from_str::<StatusResponse>(json).unwrap().into();
        assert_eq!(status.running, Some(true));
        assert_eq!(status.active["BTCUSDT"].exchanges.len(), 1);

        let empty: BackendStatus = serde_json::from_str::<StatusResponse>("{}").unwrap().into();
        assert_eq!(empty, BackendStatus::default());
    }

    #[test]
    fn test_replace_request_sends_numbers() {
        let cfg = SymbolConfig::new("BTCUSDT", dec!(2.5), dec!(1)).unwrap();
        let body = ReplaceSymbolsRequest {
            symbols: vec![SymbolUpdate::from(&cfg)],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["symbols"][0]["tp_percent"], serde_json::json!(2.5));
        assert_eq!(json["symbols"][0]["sl_percent"], serde_json::json!(1.0));
    }
}
