//! gridctl-dashboard - read-only view of lifecycle state.
//!
//! - `GET /api/snapshot` → current `RegistrySnapshot` as JSON
//! - `GET /ws` → WebSocket; full snapshot on connect, then one message per
//!   orchestrator change
//! - `GET /metrics` → Prometheus text format
//!
//! Nothing here mutates state: the orchestrator's subscribe channel is the
//! only input.
//!
//! # Usage
//!
//! ```ignore
//! use gridctl_dashboard::{run_server, DashboardConfig};
//!
//! let shutdown = CancellationToken::new();
//! tokio::spawn(run_server(orchestrator.clone(), DashboardConfig::default(), shutdown.clone()));
//! ```

mod config;
mod server;
mod types;

pub use config::DashboardConfig;
pub use server::{create_router, run_server, AppState};
pub use types::DashboardMessage;
