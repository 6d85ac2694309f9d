//! In-memory implementation of ProcessStore
//!
//! This implementation is primarily intended for testing and development purposes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{Process, ProcessChanges, ProcessStore, StoreError, StoreResult};

/// In-memory implementation of ProcessStore
///
/// Records live in a map guarded by a single lock that is held for the whole
/// of each call. All data is lost when the last clone is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProcessStore {
    records: Arc<RwLock<HashMap<String, Process>>>,
    closed: Arc<AtomicBool>,
}

impl InMemoryProcessStore {
    /// Create a new in-memory process store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl ProcessStore for InMemoryProcessStore {
    async fn insert(&self, process: &Process) -> StoreResult<()> {
        self.ensure_open()?;
        let mut records = self.records.write().await;
        records.insert(process.id.clone(), process.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Process>> {
        self.ensure_open()?;
        let records = self.records.read().await;
        Ok(records.get(id).cloned())
    }

    async fn find_all(&self) -> StoreResult<Vec<Process>> {
        self.ensure_open()?;
        let records = self.records.read().await;
        Ok(records.values().cloned().collect())
    }

    async fn update_fields(&self, id: &str, changes: &ProcessChanges) -> StoreResult<bool> {
        self.ensure_open()?;
        let mut records = self.records.write().await;
        match records.get_mut(id) {
            Some(process) => {
                changes.apply_to(process);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_by_id(&self, id: &str) -> StoreResult<bool> {
        self.ensure_open()?;
        let mut records = self.records.write().await;
        Ok(records.remove(id).is_some())
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(!self.closed.load(Ordering::Acquire))
    }

    async fn close(&self) {
        tracing::debug!("Closing in-memory process store");
        self.closed.store(true, Ordering::Release);
    }
}
