//! Response record service.
//!
//! Each operation validates its input, maps between [`ResponseRecord`] and
//! [`TableEntity`], and issues the table call. Store failures are never
//! retried here.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::model::{PayloadError, ResponsePayload, ResponseRecord};
use crate::observability::metrics;
use crate::store::StoreErrorReason::BadRow;
use crate::store::{StoreError, StoreOperation, TableEntity, TableStore};

/// Errors surfaced by [`ResponseService`], one variant per caller-visible kind.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] PayloadError),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Record {id} has informational status {status_code}, which cannot be replayed")]
    NotReplayable { id: String, status_code: u16 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// CRUD over response records held in a table store.
#[derive(Clone)]
pub struct ResponseService {
    store: Arc<dyn TableStore>,
    partition_key: String,
}

impl ResponseService {
    pub fn new(store: Arc<dyn TableStore>, partition_key: impl Into<String>) -> Self {
        Self {
            store,
            partition_key: partition_key.into(),
        }
    }

    /// Partition a record with this status code is written under.
    ///
    /// Every record shares one partition so a status change rewrites the row
    /// in place instead of leaving a copy under the old status.
    pub fn partition_key_for(&self, _status_code: u16) -> &str {
        &self.partition_key
    }

    /// Store a new record under a freshly generated id.
    pub async fn create(&self, payload: ResponsePayload) -> ServiceResult<ResponseRecord> {
        let record = ResponseRecord::create(payload)?;
        let entity = self.to_entity(&record, StoreOperation::Insert)?;

        let start = Instant::now();
        let result = self.store.insert(entity).await;
        metrics::record_store_operation(StoreOperation::Insert, result.is_ok(), start);
        if let Err(err) = &result {
            if err.is_conflict() {
                tracing::error!(id = %record.id, "Generated record id already present in table");
            }
        }
        result?;

        tracing::info!(
            id = %record.id,
            status_code = record.status_code,
            "Created response record"
        );
        Ok(record)
    }

    /// Fetch a record by id.
    pub async fn read(&self, id: &str) -> ServiceResult<ResponseRecord> {
        let entity = self
            .find(id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;

        entity.into_record().map_err(|err| {
            ServiceError::from(StoreError::new(id, StoreOperation::Query, BadRow(err.to_string())))
        })
    }

    /// Write the full record under `id`, creating it if absent.
    ///
    /// The payload must carry its timestamp so repeating the call stores the
    /// same row.
    pub async fn update(&self, id: &str, payload: ResponsePayload) -> ServiceResult<ResponseRecord> {
        let record = payload.into_replacement(id.to_string())?;
        let entity = self.to_entity(&record, StoreOperation::Upsert)?;

        let start = Instant::now();
        let result = self.store.upsert(entity).await;
        metrics::record_store_operation(StoreOperation::Upsert, result.is_ok(), start);
        result?;

        tracing::info!(
            id = %record.id,
            status_code = record.status_code,
            "Updated response record"
        );
        Ok(record)
    }

    /// Remove every row stored under `id`. Missing ids are not an error.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let entities = self.find(id).await?;
        if entities.is_empty() {
            tracing::debug!(id, "Delete of absent record");
        }

        for entity in entities {
            let start = Instant::now();
            let result = self
                .store
                .delete(&entity.partition_key, &entity.row_key)
                .await;
            metrics::record_store_operation(StoreOperation::Delete, result.is_ok(), start);
            result?;

            tracing::info!(
                id,
                partition_key = %entity.partition_key,
                "Deleted response record"
            );
        }

        Ok(())
    }

    async fn find(&self, id: &str) -> Result<Vec<TableEntity>, StoreError> {
        let start = Instant::now();
        let result = self.store.query_row_key(id).await;
        metrics::record_store_operation(StoreOperation::Query, result.is_ok(), start);

        let entities = result?;
        if entities.len() > 1 {
            tracing::warn!(id, rows = entities.len(), "Multiple rows share one record id");
        }
        Ok(entities)
    }

    fn to_entity(
        &self,
        record: &ResponseRecord,
        operation: StoreOperation,
    ) -> Result<TableEntity, StoreError> {
        TableEntity::from_record(record, self.partition_key_for(record.status_code))
            .map_err(|err| StoreError::new(record.id.clone(), operation, BadRow(err.to_string())))
    }
}
