//! Error handling for the EventBus CLI

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Facade error: {0}")]
    Facade(#[from] eventbus_facade::FacadeError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Binding rejected: {0}")]
    Binding(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
