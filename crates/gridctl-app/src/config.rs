//! Application configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use gridctl_dashboard::DashboardConfig;
use gridctl_telemetry::logging::DEFAULT_FILTER;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Config file used when neither `--config` nor `GRIDCTL_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Environment prefix for overrides (`GRIDCTL__API_URL`, ...).
const ENV_PREFIX: &str = "GRIDCTL";

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    DEFAULT_FILTER.to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Control backend root URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Per-request timeout (ms).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// JSON file holding the exchange selection.
    #[serde(default = "default_selection_file")]
    pub selection_file: PathBuf,
    /// Exchanges the operator may select.
    #[serde(default = "default_supported_exchanges")]
    pub supported_exchanges: Vec<String>,
    /// Periodic reconciliation interval (seconds, 0 = disabled).
    #[serde(default = "default_reconcile_interval_secs")]
    pub reconcile_interval_secs: u64,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_selection_file() -> PathBuf {
    PathBuf::from("./data/selected_exchanges.json")
}

fn default_supported_exchanges() -> Vec<String> {
    vec!["binance".to_string(), "bybit".to_string(), "kraken".to_string()]
}

fn default_reconcile_interval_secs() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_ms: default_request_timeout_ms(),
            selection_file: default_selection_file(),
            supported_exchanges: default_supported_exchanges(),
            reconcile_interval_secs: default_reconcile_interval_secs(),
            dashboard: DashboardConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path` (missing file = defaults), then apply `GRIDCTL__*`
    /// environment overrides.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        Self::load_with_prefix(path.as_ref(), ENV_PREFIX)
    }

    fn load_with_prefix(path: &Path, prefix: &str) -> AppResult<Self> {
        let config: Self = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(prefix)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("supported_exchanges")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the application cannot run with.
    pub fn validate(&self) -> AppResult<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "api_url must be an http(s) URL, got {:?}",
                self.api_url
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(AppError::Config("request_timeout_ms must be > 0".to_string()));
        }
        if self.supported_exchanges.iter().all(|e| e.trim().is_empty()) {
            return Err(AppError::Config(
                "supported_exchanges must name at least one exchange".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Reconciliation interval, or `None` when disabled.
    pub fn reconcile_interval(&self) -> Option<Duration> {
        (self.reconcile_interval_secs > 0).then(|| Duration::from_secs(self.reconcile_interval_secs))
    }

    /// True if `exchange` is one of the supported exchanges.
    pub fn is_supported(&self, exchange: &str) -> bool {
        let wanted = exchange.trim().to_lowercase();
        self.supported_exchanges
            .iter()
            .any(|e| e.trim().to_lowercase() == wanted)
    }

    /// Effective configuration rendered as TOML.
    pub fn to_toml(&self) -> AppResult<String> {
        toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))
    }
}
