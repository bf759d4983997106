//! Persisted row layout for response records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{ResponseRecord, StringMap};

pub(crate) const PARTITION_KEY: &str = "PartitionKey";
pub(crate) const ROW_KEY: &str = "RowKey";

/// One row of the response table.
///
/// Body, headers and cookies are held as JSON text. `StatusCode` is optional
/// so rows that only carry the status in their partition key still decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableEntity {
    pub partition_key: String,
    pub row_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub reason_phrase: String,
    pub timestamp: DateTime<Utc>,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<String>,
}

impl TableEntity {
    /// Map a record onto a row in the given partition, keyed by the record id.
    pub fn from_record(
        record: &ResponseRecord,
        partition_key: &str,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            partition_key: partition_key.to_string(),
            row_key: record.id.clone(),
            status_code: Some(record.status_code),
            reason_phrase: record.reason_phrase.clone(),
            timestamp: record.timestamp,
            body: serde_json::to_string(&record.body)?,
            headers: record.headers.as_ref().map(serde_json::to_string).transpose()?,
            cookies: record.cookies.as_ref().map(serde_json::to_string).transpose()?,
        })
    }

    /// Decode the row back into a record.
    ///
    /// Without a `StatusCode` column the partition key is tried, then 200.
    pub fn into_record(self) -> Result<ResponseRecord, serde_json::Error> {
        let status_code = self
            .status_code
            .or_else(|| self.partition_key.parse().ok())
            .unwrap_or(200);

        Ok(ResponseRecord {
            id: self.row_key,
            status_code,
            reason_phrase: self.reason_phrase,
            timestamp: self.timestamp,
            body: serde_json::from_str(&self.body)?,
            headers: decode_map(self.headers.as_deref())?,
            cookies: decode_map(self.cookies.as_deref())?,
        })
    }
}

fn decode_map(text: Option<&str>) -> Result<Option<StringMap>, serde_json::Error> {
    text.map(serde_json::from_str).transpose()
}
