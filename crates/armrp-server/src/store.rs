//! In-memory application and async operation store.

use armrp_api::AsyncOperationContext;
use armrp_core::ResourceId;
use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{OperationStatus, ResourceDefinition};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("the resource with id '{0}' was not found")]
    ApplicationNotFound(String),
    #[error("the operation with id '{0}' was not found")]
    OperationNotFound(String),
}

#[derive(Debug, Clone)]
pub struct ApplicationRecord {
    pub id: ResourceId,
    pub resources: Vec<ResourceDefinition>,
    /// Operation that last wrote this application
    pub operation_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct OperationRecord {
    pub context: AsyncOperationContext,
    pub status: OperationStatus,
}

/// Applications keyed by case-folded resource id, operations by id.
#[derive(Debug, Default)]
pub struct ResourceStore {
    applications: DashMap<String, ApplicationRecord>,
    operations: DashMap<Uuid, OperationRecord>,
}

fn key(id: &ResourceId) -> String {
    id.to_string().to_ascii_lowercase()
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an application. Returns true when it did not exist before.
    ///
    /// The operation of a replaced write is superseded and evicted.
    pub fn upsert_application(&self, record: ApplicationRecord) -> bool {
        let operation_id = record.operation_id;
        let previous = self.applications.insert(key(&record.id), record);
        if let Some(previous) = &previous {
            if previous.operation_id != operation_id {
                self.operations.remove(&previous.operation_id);
            }
        }
        let created = previous.is_none();
        tracing::debug!(created, operations = self.operations.len(), "stored application");
        created
    }

    pub fn get_application(&self, id: &ResourceId) -> Result<ApplicationRecord, StoreError> {
        self.applications
            .get(&key(id))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::ApplicationNotFound(id.to_string()))
    }

    /// Remove an application and its operation. Returns false when there was
    /// nothing to remove.
    pub fn delete_application(&self, id: &ResourceId) -> bool {
        match self.applications.remove(&key(id)) {
            Some((_, record)) => {
                self.operations.remove(&record.operation_id);
                true
            }
            None => false,
        }
    }

    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    pub fn insert_operation(&self, record: OperationRecord) {
        self.operations.insert(record.context.operation_id, record);
    }

    /// Look up an operation by the id segment of a polling URL.
    pub fn get_operation(&self, id: &str) -> Result<OperationRecord, StoreError> {
        let not_found = || StoreError::OperationNotFound(id.to_string());
        let operation_id = Uuid::parse_str(id).map_err(|_| not_found())?;
        self.operations
            .get(&operation_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(not_found)
    }
}
