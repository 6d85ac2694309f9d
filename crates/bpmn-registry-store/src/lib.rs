//! BPMN Registry Store
//!
//! Provides the storage contract for process-definition records and the
//! backends that implement it. The `ProcessStore` trait is the only way the
//! registry service touches persistence.

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

pub mod memory;
pub mod model;
pub mod sqlite;

pub use memory::InMemoryProcessStore;
pub use model::{Process, ProcessChanges};
pub use sqlite::{SqliteConfig, SqliteProcessStore};

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Store has been closed")]
    Closed,
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolClosed => StoreError::Closed,
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
                StoreError::Serialization(err.to_string())
            }
            sqlx::Error::Configuration(e) => StoreError::Configuration(e.to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Result type for ProcessStore operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Contract for process record storage.
///
/// Every call is atomic on its own; nothing here spans more than one call.
/// Record ids are unique because the caller generates them, the store does
/// not enforce it.
#[async_trait]
pub trait ProcessStore: Send + Sync + Debug {
    /// Stores a new record
    async fn insert(&self, process: &Process) -> StoreResult<()>;

    /// Looks up a record by id. A missing id is `Ok(None)`, not an error.
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Process>>;

    /// Returns every stored record in no particular order
    async fn find_all(&self) -> StoreResult<Vec<Process>>;

    /// Merges `changes` into the record matching `id`.
    /// Returns whether a record was found and updated.
    async fn update_fields(&self, id: &str, changes: &ProcessChanges) -> StoreResult<bool>;

    /// Removes the record matching `id`. Returns whether a record was removed.
    async fn delete_by_id(&self, id: &str) -> StoreResult<bool>;

    /// Checks that the backend is reachable
    async fn health_check(&self) -> StoreResult<bool>;

    /// Releases the underlying connection. Later calls fail with `StoreError::Closed`.
    async fn close(&self) {}
}

/// Creates a store from a URL.
///
/// Supported schemes:
/// - `memory://...` for the in-memory store
/// - `sqlite:...` for SQLite, e.g. `sqlite://registry.db` or `sqlite::memory:`
pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Arc<dyn ProcessStore>> {
    if url.starts_with("memory://") {
        tracing::info!("Using in-memory process store");
        Ok(Arc::new(InMemoryProcessStore::new()))
    } else if url.starts_with("sqlite:") {
        tracing::info!(url, "Using SQLite process store");
        let config = SqliteConfig {
            url: url.to_string(),
            max_connections,
        };
        let store = SqliteProcessStore::connect(&config).await?;
        Ok(Arc::new(store))
    } else {
        Err(StoreError::Configuration(format!(
            "Unsupported process store URL: {}",
            url
        )))
    }
}
