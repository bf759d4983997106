//! DynamoDB-backed table store.
//!
//! # Responsibilities
//! - Own the SDK client for the response table
//! - Create the table on first start (hash `PartitionKey`, range `RowKey`)
//! - Translate rows to and from DynamoDB items with `serde_dynamo`
//!
//! # Design Decisions
//! - No retry layer here; the SDK's default retry policy applies
//! - Point queries by row key scan with a filter so rows in any partition match

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::operation::create_table::CreateTableError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType,
    ScalarAttributeType, TableStatus,
};

use crate::store::entity::{PARTITION_KEY, ROW_KEY};
use crate::store::StoreErrorReason::{BackendFailure, BadRow, Conflict};
use crate::store::StoreOperation::{Delete, EnsureTable, Insert, Query, Upsert};
use crate::store::{StoreError, StoreOperation, TableEntity, TableStore};

type Item = HashMap<String, AttributeValue>;

const ROW_KEY_NAME: &str = "#rk";
const ROW_KEY_VALUE: &str = ":rk";
const TABLE_READY_ATTEMPTS: u32 = 30;
const TABLE_READY_INTERVAL: Duration = Duration::from_secs(1);
const CREDENTIALS_PROVIDER: &str = "return-response-config";

/// Where and as whom to connect to the table service.
#[derive(Clone)]
pub struct ConnectionSettings {
    /// Endpoint override (local emulators, VPC endpoints).
    pub endpoint_uri: Option<String>,
    pub account_name: String,
    pub account_key: String,
    pub region: String,
}

impl Debug for ConnectionSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("endpoint_uri", &self.endpoint_uri)
            .field("account_name", &self.account_name)
            .field("account_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

impl ConnectionSettings {
    /// Build an SDK client using static credentials from these settings.
    pub fn client(&self) -> aws_sdk_dynamodb::Client {
        let credentials = Credentials::new(
            &self.account_name,
            &self.account_key,
            None,
            None,
            CREDENTIALS_PROVIDER,
        );

        let mut builder = aws_sdk_dynamodb::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(credentials);
        if let Some(endpoint) = &self.endpoint_uri {
            builder = builder.endpoint_url(endpoint);
        }

        aws_sdk_dynamodb::Client::from_conf(builder.build())
    }
}

pub struct DynamoDbTableStore {
    table_name: String,
    dynamodb_client: aws_sdk_dynamodb::Client,
}

impl DynamoDbTableStore {
    pub fn new(dynamodb_client: aws_sdk_dynamodb::Client, table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            dynamodb_client,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn wait_until_active(&self) -> Result<(), StoreError> {
        for attempt in 1..=TABLE_READY_ATTEMPTS {
            let output = self
                .dynamodb_client
                .describe_table()
                .table_name(&self.table_name)
                .send()
                .await
                .map_err(|err| backend_failure("", EnsureTable, err))?;

            let status = output.table().and_then(|table| table.table_status());
            if status == Some(&TableStatus::Active) {
                return Ok(());
            }

            tracing::debug!(
                table = %self.table_name,
                attempt,
                status = ?status,
                "Waiting for table to become active"
            );
            tokio::time::sleep(TABLE_READY_INTERVAL).await;
        }

        Err(StoreError::new(
            "",
            EnsureTable,
            BackendFailure(format!("table '{}' did not become active", self.table_name).into()),
        ))
    }

    fn to_item(entity: &TableEntity, operation: StoreOperation) -> Result<Item, StoreError> {
        serde_dynamo::to_item(entity)
            .map_err(|err| StoreError::new(entity.row_key.clone(), operation, BadRow(err.to_string())))
    }

    fn key_attribute(name: &str, value: &str) -> (String, AttributeValue) {
        (name.to_string(), AttributeValue::S(value.to_string()))
    }
}

fn backend_failure<E>(row_key: &str, operation: StoreOperation, err: E) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    tracing::debug!(
        row_key,
        operation = %operation,
        error = %DisplayErrorContext(&err),
        "Table service call failed"
    );
    StoreError::new(row_key, operation, BackendFailure(err.into()))
}

fn key_schema(name: &str, key_type: KeyType) -> Result<KeySchemaElement, StoreError> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(key_type)
        .build()
        .map_err(|err| StoreError::new("", EnsureTable, BadRow(err.to_string())))
}

fn string_attribute(name: &str) -> Result<AttributeDefinition, StoreError> {
    AttributeDefinition::builder()
        .attribute_name(name)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(|err| StoreError::new("", EnsureTable, BadRow(err.to_string())))
}

#[async_trait]
impl TableStore for DynamoDbTableStore {
    async fn ensure_table(&self) -> Result<(), StoreError> {
        let result = self
            .dynamodb_client
            .create_table()
            .table_name(&self.table_name)
            .attribute_definitions(string_attribute(PARTITION_KEY)?)
            .attribute_definitions(string_attribute(ROW_KEY)?)
            .key_schema(key_schema(PARTITION_KEY, KeyType::Hash)?)
            .key_schema(key_schema(ROW_KEY, KeyType::Range)?)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await;

        match result {
            Ok(_) => {
                tracing::info!(table = %self.table_name, "Created table");
                self.wait_until_active().await
            }
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(CreateTableError::is_resource_in_use_exception) =>
            {
                tracing::debug!(table = %self.table_name, "Table already exists");
                Ok(())
            }
            Err(err) => Err(backend_failure("", EnsureTable, err)),
        }
    }

    async fn insert(&self, entity: TableEntity) -> Result<(), StoreError> {
        let item = Self::to_item(&entity, Insert)?;

        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression(format!("attribute_not_exists({ROW_KEY_NAME})"))
            .expression_attribute_names(ROW_KEY_NAME, ROW_KEY)
            .send()
            .await
            .map_err(|err| {
                if err
                    .as_service_error()
                    .is_some_and(PutItemError::is_conditional_check_failed_exception)
                {
                    StoreError::new(entity.row_key.clone(), Insert, Conflict)
                } else {
                    backend_failure(&entity.row_key, Insert, err)
                }
            })?;

        Ok(())
    }

    async fn query_row_key(&self, row_key: &str) -> Result<Vec<TableEntity>, StoreError> {
        let mut entities = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let output = self
                .dynamodb_client
                .scan()
                .table_name(&self.table_name)
                .filter_expression(format!("{ROW_KEY_NAME} = {ROW_KEY_VALUE}"))
                .expression_attribute_names(ROW_KEY_NAME, ROW_KEY)
                .expression_attribute_values(ROW_KEY_VALUE, AttributeValue::S(row_key.to_string()))
                .consistent_read(true)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|err| backend_failure(row_key, Query, err))?;

            for item in output.items.unwrap_or_default() {
                let entity: TableEntity = serde_dynamo::from_item(item)
                    .map_err(|err| StoreError::new(row_key, Query, BadRow(err.to_string())))?;
                entities.push(entity);
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(entities)
    }

    async fn upsert(&self, entity: TableEntity) -> Result<(), StoreError> {
        let item = Self::to_item(&entity, Upsert)?;

        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|err| backend_failure(&entity.row_key, Upsert, err))?;

        Ok(())
    }

    async fn delete(&self, partition_key: &str, row_key: &str) -> Result<(), StoreError> {
        let key: Item = [
            Self::key_attribute(PARTITION_KEY, partition_key),
            Self::key_attribute(ROW_KEY, row_key),
        ]
        .into_iter()
        .collect();

        self.dynamodb_client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key))
            .send()
            .await
            .map_err(|err| backend_failure(row_key, Delete, err))?;

        Ok(())
    }
}
