//! Error handling for the EventBus facade

use std::path::PathBuf;

use thiserror::Error;

/// Facade-level errors: configuration I/O and parsing
#[derive(Error, Debug)]
pub enum FacadeError {
    #[error("EventBus error: {0}")]
    EventBus(#[from] eventbus_core::EventBusError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid allowlist rule: {0}")]
    InvalidRule(String),
}

impl FacadeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FacadeError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for facade operations
pub type Result<T> = std::result::Result<T, FacadeError>;
