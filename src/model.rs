//! Response record data model.
//!
//! A [`ResponseRecord`] describes an HTTP response: status code, reason
//! phrase, timestamp, JSON body and optional header and cookie maps. Records
//! arrive as [`ResponsePayload`]s, which carry only the caller-owned fields;
//! the service assigns identity and defaults.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Name/value pairs stored alongside a record (headers or cookies).
pub type StringMap = BTreeMap<String, String>;

/// A stored description of an HTTP response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    /// Generated at creation and never changed afterwards.
    pub id: String,
    pub status_code: u16,
    pub reason_phrase: String,
    pub timestamp: DateTime<Utc>,
    pub body: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<StringMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<StringMap>,
}

/// Caller-supplied fields of a record, as accepted by create and update.
///
/// Unknown fields (including a client-sent `id`) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePayload {
    #[serde(default = "default_status_code")]
    pub status_code: u16,
    #[serde(default)]
    pub reason_phrase: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub body: serde_json::Value,
    #[serde(default)]
    pub headers: Option<StringMap>,
    #[serde(default)]
    pub cookies: Option<StringMap>,
}

fn default_status_code() -> u16 {
    StatusCode::OK.as_u16()
}

impl Default for ResponsePayload {
    fn default() -> Self {
        Self {
            status_code: default_status_code(),
            reason_phrase: None,
            timestamp: None,
            body: serde_json::Value::Null,
            headers: None,
            cookies: None,
        }
    }
}

/// Rejection of a payload before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("Invalid HTTP status code: {0}")]
    UnknownStatusCode(u16),

    #[error("A replacement record must carry a timestamp")]
    MissingTimestamp,
}

/// Returns the status code if it is a registered HTTP status.
///
/// `StatusCode::from_u16` accepts anything in 100..=999, so a code is only
/// considered recognized when it also has a canonical reason phrase.
pub fn recognized_status(code: u16) -> Result<StatusCode, PayloadError> {
    StatusCode::from_u16(code)
        .ok()
        .filter(|status| status.canonical_reason().is_some())
        .ok_or(PayloadError::UnknownStatusCode(code))
}

impl ResponsePayload {
    /// Check the payload without touching any store.
    pub fn validate(&self) -> Result<StatusCode, PayloadError> {
        recognized_status(self.status_code)
    }

    /// Turn the payload into a record with the given identity.
    ///
    /// Missing reason phrase falls back to the canonical phrase of the status
    /// code, missing timestamp to now.
    pub fn into_record(self, id: String) -> Result<ResponseRecord, PayloadError> {
        let status = self.validate()?;
        let reason_phrase = self
            .reason_phrase
            .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());

        Ok(ResponseRecord {
            id,
            status_code: status.as_u16(),
            reason_phrase,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            body: self.body,
            headers: self.headers,
            cookies: self.cookies,
        })
    }

    /// Turn the payload into a full replacement for the record `id`.
    ///
    /// Unlike [`ResponsePayload::into_record`] the timestamp is required, so
    /// the same payload always produces the same record.
    pub fn into_replacement(self, id: String) -> Result<ResponseRecord, PayloadError> {
        self.validate()?;
        if self.timestamp.is_none() {
            return Err(PayloadError::MissingTimestamp);
        }
        self.into_record(id)
    }
}

impl ResponseRecord {
    /// Build a fresh record with a newly generated id.
    pub fn create(payload: ResponsePayload) -> Result<Self, PayloadError> {
        payload.into_record(new_record_id())
    }
}

/// Generate a record identifier.
pub fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_defaults() {
        let payload: ResponsePayload = serde_json::from_value(json!({})).unwrap();
        let record = ResponseRecord::create(payload).unwrap();

        assert!(!record.id.is_empty());
        assert_eq!(record.status_code, 200);
        assert_eq!(record.reason_phrase, "OK");
        assert_eq!(record.timestamp.date_naive(), Utc::now().date_naive());
        assert_eq!(record.body, serde_json::Value::Null);
        assert!(record.headers.is_none());
        assert!(record.cookies.is_none());
    }

    #[test]
    fn test_payload_with_values() {
        let payload: ResponsePayload = serde_json::from_value(json!({
            "statusCode": 404,
            "reasonPhrase": "Not Found",
            "body": "Error: Not Found",
            "headers": { "X-Custom-Header": "HeaderValue" },
        }))
        .unwrap();
        let record = ResponseRecord::create(payload).unwrap();

        assert_eq!(record.status_code, 404);
        assert_eq!(record.reason_phrase, "Not Found");
        assert_eq!(record.body, json!("Error: Not Found"));
        assert_eq!(
            record.headers.unwrap().get("X-Custom-Header").map(String::as_str),
            Some("HeaderValue")
        );
    }

    #[test]
    fn test_reason_defaults_to_canonical_phrase() {
        let payload = ResponsePayload {
            status_code: 418,
            ..Default::default()
        };
        let record = ResponseRecord::create(payload).unwrap();
        assert_eq!(record.reason_phrase, "I'm a teapot");
    }

    #[test]
    fn test_client_id_is_ignored() {
        let payload: ResponsePayload =
            serde_json::from_value(json!({ "id": "client-chosen", "statusCode": 201 })).unwrap();
        let record = ResponseRecord::create(payload).unwrap();
        assert_ne!(record.id, "client-chosen");
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(new_record_id(), new_record_id());
    }

    #[test]
    fn test_status_validation() {
        assert!(recognized_status(200).is_ok());
        assert!(recognized_status(503).is_ok());
        assert_eq!(
            recognized_status(999),
            Err(PayloadError::UnknownStatusCode(999))
        );
        assert!(recognized_status(0).is_err());
        assert!(recognized_status(600).is_err());
        assert!(recognized_status(299).is_err());
    }

    #[test]
    fn test_replacement_requires_timestamp() {
        let payload = ResponsePayload {
            status_code: 404,
            reason_phrase: Some("Not Found".to_string()),
            body: json!("gone"),
            ..Default::default()
        };
        assert_eq!(
            payload.clone().into_replacement("id1".to_string()),
            Err(PayloadError::MissingTimestamp)
        );

        let stamped = ResponsePayload {
            timestamp: Some(Utc::now()),
            ..payload
        };
        let once = stamped.clone().into_replacement("id1".to_string()).unwrap();
        let twice = stamped.into_replacement("id1".to_string()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_replacement_checks_status_first() {
        let payload = ResponsePayload {
            status_code: 999,
            ..Default::default()
        };
        assert_eq!(
            payload.into_replacement("id1".to_string()),
            Err(PayloadError::UnknownStatusCode(999))
        );
    }

    #[test]
    fn test_record_wire_format() {
        let record = ResponseRecord::create(ResponsePayload {
            status_code: 200,
            reason_phrase: Some("OK".to_string()),
            body: json!("hello"),
            ..Default::default()
        })
        .unwrap();

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["reasonPhrase"], "OK");
        assert_eq!(value["body"], "hello");
        assert!(value.get("headers").is_none());
        assert!(value.get("cookies").is_none());
    }
}
