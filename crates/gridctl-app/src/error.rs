//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend client error: {0}")]
    Client(#[from] gridctl_client::ClientError),

    #[error("{0}")]
    Orchestrator(#[from] gridctl_orchestrator::OrchestratorError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] gridctl_telemetry::TelemetryError),

    #[error("{0}")]
    Command(String),

    #[error("Dashboard error: {0}")]
    Dashboard(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
