//! Engine errors
//!
//! Core operations cannot fail: absence is `None` and unsupported
//! predicate shapes fall back to scans. Errors only arise while loading
//! and applying configuration.

use std::io;

use thiserror::Error;

/// Result type for mdao operations
pub type MdaoResult<T> = Result<T, MdaoError>;

/// mdao errors
#[derive(Debug, Error)]
pub enum MdaoError {
    #[error("Failed to read config {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    ConfigInvalid(String),
}

impl MdaoError {
    /// Creates an invalid-configuration error
    pub fn invalid(message: impl Into<String>) -> Self {
        MdaoError::ConfigInvalid(message.into())
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            MdaoError::ConfigIo { .. } => "MDAO_CONFIG_IO",
            MdaoError::ConfigParse(_) => "MDAO_CONFIG_PARSE",
            MdaoError::ConfigInvalid(_) => "MDAO_CONFIG_INVALID",
        }
    }
}
