//! HTTP implementation of the backend REST surface.

use std::time::Duration;

use gridctl_core::{ExchangeId, SymbolConfig};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::backend::{BotBackend, BoxFuture};
use crate::error::{ClientError, ClientResult};
use crate::types::{
    BackendStatus, ConfiguredSymbolsResponse, ReplaceSymbolsRequest, StartSymbolRequest,
    StatusResponse, StopSymbolRequest, SymbolUpdate, TradableSymbolsResponse,
};

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const CONFIGURED_SYMBOLS_PATH: &str = "/symbols/";
const TRADABLE_SYMBOLS_PATH: &str = "/list/symbols/";
const STATUS_PATH: &str = "/grid-bot/status";
const START_SYMBOL_PATH: &str = "/grid-bot/start-symbol";
const STOP_SYMBOL_PATH: &str = "/stop_symbol";

/// Client for the control backend.
pub struct HttpBackend {
    /// HTTP client.
    client: Client,
    /// Base URL without trailing slash (e.g., "http://localhost:8000").
    base_url: String,
}

impl HttpBackend {
    /// Create a new backend client.
    ///
    /// # Arguments
    /// * `base_url` - Backend root URL (e.g., "http://localhost:8000")
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!(%base_url, timeout_ms = timeout.as_millis() as u64, "Backend client created");

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.url(path);
        debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("{path}: {e}")))
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> ClientResult<()> {
        let url = self.url(path);
        debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;

        check_status(response).await?;
        Ok(())
    }
}

/// Turn a non-success status into `ClientError::Status`.
async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

impl BotBackend for HttpBackend {
    fn list_configured_symbols(&self) -> BoxFuture<'_, ClientResult<Vec<SymbolConfig>>> {
        Box::pin(async move {
            let resp: ConfiguredSymbolsResponse = self.get_json(CONFIGURED_SYMBOLS_PATH).await?;
            let configs: Vec<SymbolConfig> = resp
                .symbols
                .iter()
                .filter_map(|entry| entry.to_config())
                .collect();
            debug!(count = configs.len(), "Fetched configured symbols");
            Ok(configs)
        })
    }

    fn list_tradable_symbols(&self) -> BoxFuture<'_, ClientResult<Vec<String>>> {
        Box::pin(async move {
            let resp: TradableSymbolsResponse = self.get_json(TRADABLE_SYMBOLS_PATH).await?;
            debug!(count = resp.symbols.len(), "Fetched tradable symbols");
            Ok(resp.symbols)
        })
    }

    fn replace_symbols(&self, symbols: Vec<SymbolConfig>) -> BoxFuture<'_, ClientResult<()>> {
        Box::pin(async move {
            let body = ReplaceSymbolsRequest {
                symbols: symbols.iter().map(SymbolUpdate::from).collect(),
            };
            self.post_json(CONFIGURED_SYMBOLS_PATH, &body).await
        })
    }

    fn fetch_status(&self) -> BoxFuture<'_, ClientResult<BackendStatus>> {
        Box::pin(async move {
            let resp: StatusResponse = self.get_json(STATUS_PATH).await?;
            Ok(resp.into())
        })
    }

    fn start_symbol(&self, exchange: ExchangeId, symbol: String) -> BoxFuture<'_, ClientResult<()>> {
        Box::pin(async move {
            let body = StartSymbolRequest { exchange, symbol };
            self.post_json(START_SYMBOL_PATH, &body).await
        })
    }

    fn stop_symbol(
        &self,
        symbol: String,
        exchange: Option<ExchangeId>,
    ) -> BoxFuture<'_, ClientResult<()>> {
        Box::pin(async move {
            let body = StopSymbolRequest { symbol, exchange };
            self.post_json(STOP_SYMBOL_PATH, &body).await
        })
    }
}
