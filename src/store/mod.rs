//! Table storage subsystem.
//!
//! # Data Flow
//! ```text
//! ResponseService
//!     → TableStore trait (insert / query / upsert / delete)
//!     → dynamodb.rs (remote table service via the AWS SDK)
//!       or memory.rs (process-local table)
//! ```
//!
//! # Design Decisions
//! - Adapters are pass-through: no retries beyond the SDK's own
//! - Rows are addressed by (partition key, row key)
//! - The adapter is built once at startup and shared behind an `Arc`

pub mod dynamodb;
pub mod entity;
pub mod memory;

use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use thiserror::Error;

pub use dynamodb::DynamoDbTableStore;
pub use entity::TableEntity;
pub use memory::InMemoryTableStore;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A partition/row keyed table holding [`TableEntity`] rows.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Create the backing table if it does not exist yet.
    async fn ensure_table(&self) -> Result<(), StoreError>;

    /// Add a row. Fails with [`StoreErrorReason::Conflict`] if it already exists.
    async fn insert(&self, entity: TableEntity) -> Result<(), StoreError>;

    /// All rows whose row key equals `row_key`, in any partition.
    async fn query_row_key(&self, row_key: &str) -> Result<Vec<TableEntity>, StoreError>;

    /// Insert the row, or replace it entirely if present.
    async fn upsert(&self, entity: TableEntity) -> Result<(), StoreError>;

    /// Remove a row. Removing an absent row succeeds.
    async fn delete(&self, partition_key: &str, row_key: &str) -> Result<(), StoreError>;
}

/// Errors raised by a table store.
#[derive(Debug, Error)]
#[error("{operation} failed for row '{row_key}': {reason}")]
pub struct StoreError {
    pub row_key: String,
    pub operation: StoreOperation,
    #[source]
    pub reason: StoreErrorReason,
}

#[derive(Debug, Error)]
pub enum StoreErrorReason {
    /// A row with the same key already exists.
    #[error("row already exists")]
    Conflict,
    /// The row could not be mapped to or from the table layout.
    #[error("malformed row: {0}")]
    BadRow(String),
    /// An error from the underlying table service.
    #[error("backend failure: {0}")]
    BackendFailure(BoxError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    EnsureTable,
    Insert,
    Query,
    Upsert,
    Delete,
}

impl StoreOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOperation::EnsureTable => "ensure_table",
            StoreOperation::Insert => "insert",
            StoreOperation::Query => "query",
            StoreOperation::Upsert => "upsert",
            StoreOperation::Delete => "delete",
        }
    }
}

impl Display for StoreOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StoreError {
    pub fn new(row_key: impl Into<String>, operation: StoreOperation, reason: StoreErrorReason) -> Self {
        StoreError {
            row_key: row_key.into(),
            operation,
            reason,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self.reason, StoreErrorReason::Conflict)
    }
}
