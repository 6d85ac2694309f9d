//! Registry service
//!
//! Implements the process CRUD and export contract on top of a
//! `ProcessStore`. It owns id and timestamp generation and the partial
//! update policy. Outcomes are reported as `RegistryError` kinds; the HTTP
//! layer decides the status codes.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use bpmn_registry_store::{Process, ProcessChanges, ProcessStore, StoreError};

/// File extension appended to the process name on export
pub const EXPORT_EXTENSION: &str = "bpmn";

/// Registry error kinds
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No process with the requested id
    #[error("Process not found: {0}")]
    NotFound(String),

    /// The process exists but has no BPMN payload to export
    #[error("No BPMN XML stored for process {0}")]
    NoContent(String),

    /// The request is well-formed JSON but not acceptable
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backing store failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RegistryError {
    /// Whether this is a backend fault rather than a client-visible condition
    pub fn is_fault(&self) -> bool {
        matches!(self, RegistryError::Store(_))
    }
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Input for creating a process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProcess {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub bpmn_xml: Option<String>,
}

impl NewProcess {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            bpmn_xml: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_bpmn_xml(mut self, bpmn_xml: impl Into<String>) -> Self {
        self.bpmn_xml = Some(bpmn_xml.into());
        self
    }
}

/// Input for updating a process.
///
/// Each field is tri-state: `None` when the key was absent from the request,
/// `Some(None)` when it was sent as `null`, `Some(Some(v))` otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProcessPatch {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub bpmn_xml: Option<Option<String>>,
}

/// Marks a key that appeared in the payload, even with a `null` value
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ProcessPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(Some(name.into()));
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn bpmn_xml(mut self, bpmn_xml: Option<String>) -> Self {
        self.bpmn_xml = Some(bpmn_xml);
        self
    }

    /// Converts the patch into store changes stamped with `updated_at`
    fn into_changes(self, updated_at: DateTime<Utc>) -> RegistryResult<ProcessChanges> {
        let name = match self.name {
            Some(Some(name)) => Some(name),
            Some(None) => {
                return Err(RegistryError::Validation("name cannot be null".to_string()));
            }
            None => None,
        };

        Ok(ProcessChanges {
            name,
            description: self.description,
            bpmn_xml: self.bpmn_xml,
            updated_at,
        })
    }
}

/// An exported BPMN document ready to be served as a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExport {
    /// Suggested file name, `{name}.bpmn`, built from the name verbatim
    pub filename: String,
    pub content: String,
}

/// Registry service over an injected process store
#[derive(Debug, Clone)]
pub struct RegistryService {
    store: Arc<dyn ProcessStore>,
}

impl RegistryService {
    /// Create a new registry service
    pub fn new(store: Arc<dyn ProcessStore>) -> Self {
        Self { store }
    }

    /// The underlying store handle
    pub fn store(&self) -> &Arc<dyn ProcessStore> {
        &self.store
    }

    /// List every process, in store order
    pub async fn list(&self) -> RegistryResult<Vec<Process>> {
        let processes = self.store.find_all().await?;
        debug!(count = processes.len(), "Listed processes");
        Ok(processes)
    }

    /// Get a process by id
    pub async fn get(&self, id: &str) -> RegistryResult<Process> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Create a process with a fresh id
    pub async fn create(&self, input: NewProcess) -> RegistryResult<Process> {
        let now = now();
        let process = Process {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            description: input.description,
            bpmn_xml: input.bpmn_xml,
            created_at: now,
            updated_at: now,
        };

        self.store.insert(&process).await?;
        info!(process_id = %process.id, "Created new process");
        Ok(process)
    }

    /// Merge the fields present in `patch` into an existing process.
    ///
    /// There is no version check: concurrent updates to the same id are
    /// last-writer-wins for the fields each one touches.
    pub async fn update(&self, id: &str, patch: ProcessPatch) -> RegistryResult<Process> {
        let existing = self.get(id).await?;

        // Never move updated_at backwards, even if the clock does.
        let updated_at = now().max(existing.updated_at);
        let changes = patch.into_changes(updated_at)?;

        if !self.store.update_fields(id, &changes).await? {
            warn!(process_id = %id, "Process disappeared before update was applied");
            return Err(RegistryError::NotFound(id.to_string()));
        }

        let updated = self.get(id).await?;
        info!(process_id = %id, "Updated process");
        Ok(updated)
    }

    /// Delete a process permanently
    pub async fn delete(&self, id: &str) -> RegistryResult<()> {
        if !self.store.delete_by_id(id).await? {
            return Err(RegistryError::NotFound(id.to_string()));
        }
        info!(process_id = %id, "Deleted process");
        Ok(())
    }

    /// Export the stored BPMN payload of a process
    pub async fn export(&self, id: &str) -> RegistryResult<ProcessExport> {
        let process = self.get(id).await?;

        match process.bpmn_xml {
            Some(content) if !content.is_empty() => {
                debug!(process_id = %id, bytes = content.len(), "Exporting process");
                Ok(ProcessExport {
                    filename: format!("{}.{}", process.name, EXPORT_EXTENSION),
                    content,
                })
            }
            _ => Err(RegistryError::NoContent(id.to_string())),
        }
    }

    /// Whether the backing store is reachable
    pub async fn health(&self) -> RegistryResult<bool> {
        Ok(self.store.health_check().await?)
    }
}

/// Current time at the precision every store backend round-trips
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
