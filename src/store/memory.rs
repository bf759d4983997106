use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::store::StoreErrorReason::Conflict;
use crate::store::StoreOperation::Insert;
use crate::store::{StoreError, TableEntity, TableStore};

type RowAddress = (String, String);

/// Process-local table. Contents live as long as the process.
#[derive(Clone, Default)]
pub struct InMemoryTableStore {
    rows: Arc<RwLock<BTreeMap<RowAddress, TableEntity>>>,
}

impl InMemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently held.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

fn address(entity: &TableEntity) -> RowAddress {
    (entity.partition_key.clone(), entity.row_key.clone())
}

#[async_trait]
impl TableStore for InMemoryTableStore {
    async fn ensure_table(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert(&self, entity: TableEntity) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        let key = address(&entity);
        if rows.contains_key(&key) {
            return Err(StoreError::new(entity.row_key, Insert, Conflict));
        }
        rows.insert(key, entity);

        Ok(())
    }

    async fn query_row_key(&self, row_key: &str) -> Result<Vec<TableEntity>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|entity| entity.row_key == row_key)
            .cloned()
            .collect())
    }

    async fn upsert(&self, entity: TableEntity) -> Result<(), StoreError> {
        self.rows.write().await.insert(address(&entity), entity);
        Ok(())
    }

    async fn delete(&self, partition_key: &str, row_key: &str) -> Result<(), StoreError> {
        self.rows
            .write()
            .await
            .remove(&(partition_key.to_string(), row_key.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entity(partition_key: &str, row_key: &str, body: &str) -> TableEntity {
        TableEntity {
            partition_key: partition_key.to_string(),
            row_key: row_key.to_string(),
            status_code: Some(200),
            reason_phrase: "OK".to_string(),
            timestamp: Utc::now(),
            body: body.to_string(),
            headers: None,
            cookies: None,
        }
    }

    #[tokio::test]
    async fn test_insert_conflict() {
        let store = InMemoryTableStore::new();
        store.insert(entity("p", "r1", "\"a\"")).await.unwrap();

        let err = store.insert(entity("p", "r1", "\"b\"")).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(err.row_key, "r1");

        let rows = store.query_row_key("r1").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].body, "\"a\"");
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let store = InMemoryTableStore::new();
        store.upsert(entity("p", "r1", "\"a\"")).await.unwrap();
        store.upsert(entity("p", "r1", "\"b\"")).await.unwrap();

        let rows = store.query_row_key("r1").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].body, "\"b\"");
    }

    #[tokio::test]
    async fn test_query_spans_partitions() {
        let store = InMemoryTableStore::new();
        store.insert(entity("200", "r1", "1")).await.unwrap();
        store.insert(entity("404", "r1", "2")).await.unwrap();
        store.insert(entity("200", "r2", "3")).await.unwrap();

        assert_eq!(store.query_row_key("r1").await.unwrap().len(), 2);
        assert!(store.query_row_key("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_exact_and_idempotent() {
        let store = InMemoryTableStore::new();
        store.insert(entity("200", "r1", "1")).await.unwrap();
        store.insert(entity("404", "r1", "2")).await.unwrap();

        store.delete("200", "r1").await.unwrap();
        store.delete("200", "r1").await.unwrap();

        let rows = store.query_row_key("r1").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].partition_key, "404");
        assert_eq!(store.len().await, 1);
    }
}
