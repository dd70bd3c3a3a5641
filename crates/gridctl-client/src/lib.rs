//! REST client for the grid-bot control backend.
//!
//! `BotBackend` is the seam between the orchestrator and the network:
//! - `HttpBackend`: reqwest implementation of the backend's REST surface
//! - `MockBackend`: in-memory backend that records calls, for tests

pub mod backend;
pub mod error;
pub mod http;
pub mod mock;
pub mod types;

pub use backend::{BackendCall, BotBackend, BoxFuture, DynBackend};
pub use error::{ClientError, ClientResult};
pub use http::HttpBackend;
pub use mock::MockBackend;
pub use types::BackendStatus;
