//! Error types for the BPMN Registry Server
//!
//! `ServerError` covers startup and lifecycle failures. Request-level
//! failures are `RegistryError` (see `service`) and are mapped to HTTP
//! responses in `api::errors`.

use thiserror::Error;
use bpmn_registry_store::StoreError;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Process store could not be opened
    #[error("Process store error: {0}")]
    StoreError(#[from] StoreError),

    /// Socket or other IO failure
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;
