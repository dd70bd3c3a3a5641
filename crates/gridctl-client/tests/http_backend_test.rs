//! HttpBackend integration tests against an in-process mock API.

mod common;
use common::mock_api::MockApi;

use std::time::Duration;

use gridctl_client::{BotBackend, ClientError, HttpBackend};
use gridctl_core::{ExchangeId, SymbolConfig};
use rust_decimal_macros::dec;
use serde_json::json;

fn backend(api: &MockApi) -> HttpBackend {
    HttpBackend::new(api.url(), Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_list_configured_symbols() {
    let api = MockApi::start().await;
    let configs = backend(&api).list_configured_symbols().await.unwrap();

    assert_eq!(configs.len(), 2);
    assert_eq!(configs[0].symbol, "BTCUSDT");
    assert_eq!(configs[0].take_profit_percent, dec!(2.5));
    assert_eq!(configs[1].take_profit_percent, dec!(2.0));
    assert_eq!(configs[1].stop_loss_percent, dec!(1.0));
    api.shutdown();
}

#[tokio::test]
async fn test_list_tradable_symbols() {
    let api = MockApi::start().await;
    let symbols = backend(&api).list_tradable_symbols().await.unwrap();
    assert_eq!(symbols, vec!["BTCUSDT", "ETHUSDT", "SOLUSDC"]);
    api.shutdown();
}

#[tokio::test]
async fn test_fetch_status() {
    let api = MockApi::start().await;
    let status = backend(&api).fetch_status().await.unwrap();

    assert_eq!(status.running, Some(true));
    let btc = &status.active["BTCUSDT"];
    assert!(btc.exchanges.contains(&ExchangeId::new("binance")));
    assert!(btc.exchanges.contains(&ExchangeId::new("kraken")));
    assert!(status.active["ETHUSDT"].exchanges.is_empty());
    api.shutdown();
}

#[tokio::test]
async fn test_lifecycle_request_bodies() {
    let api = MockApi::start().await;
    let backend = backend(&api);

    backend
        .start_symbol(ExchangeId::new("binance"), "BTCUSDT".to_string())
        .await
        .unwrap();
    backend
        .stop_symbol("BTCUSDT".to_string(), Some(ExchangeId::new("binance")))
        .await
        .unwrap();
    backend
        .stop_symbol("BTCUSDT".to_string(), None)
        .await
        .unwrap();

    let received = api.received().await;
    assert_eq!(received.len(), 3);
    assert_eq!(received[0].0, "/grid-bot/start-symbol");
    assert_eq!(received[0].1, json!({"exchange": "binance", "symbol": "BTCUSDT"}));
    assert_eq!(received[1].1, json!({"symbol": "BTCUSDT", "exchange": "binance"}));
    assert_eq!(received[2].1, json!({"symbol": "BTCUSDT"}));
    api.shutdown();
}

#[tokio::test]
async fn test_replace_symbols_body() {
    let api = MockApi::start().await;
    let configs = vec![SymbolConfig::new("BTCUSDT", dec!(3), dec!(1.5)).unwrap()];
    backend(&api).replace_symbols(configs).await.unwrap();
    backend(&api).replace_symbols(Vec::new()).await.unwrap();

    let received = api.received().await;
    assert_eq!(
        received[0].1,
        json!({"symbols": [{"symbol": "BTCUSDT", "tp_percent": 3.0, "sl_percent": 1.5}]})
    );
    assert_eq!(received[1].1, json!({"symbols": []}));
    api.shutdown();
}

#[tokio::test]
async fn test_non_success_status_is_error() {
    let api = MockApi::start().await;
    api.fail_start().await;

    let err = backend(&api)
        .start_symbol(ExchangeId::new("binance"), "BTCUSDT".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 400, .. }));
    api.shutdown();
}

#[tokio::test]
async fn test_unreachable_backend_is_http_error() {
    let backend = HttpBackend::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
    let err = backend.fetch_status().await.unwrap_err();
    assert!(matches!(err, ClientError::Http(_)));
}
