//! gridctl - command-line controller for grid-bot symbol lifecycles.
//!
//! Wires the HTTP backend client, the on-disk exchange selection and the
//! lifecycle orchestrator together, and implements the CLI commands on top.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;

pub use app::Application;
pub use cli::{Command, ExchangesCommand};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
