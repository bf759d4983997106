//! Response shaping.
//!
//! # Responsibilities
//! - Map service errors to HTTP status codes and JSON error bodies
//! - Render a stored record as the HTTP response it describes (replay)
//!
//! # Design Decisions
//! - Store failures are reported as 500 with the failure message
//! - Replay never overwrites headers set by the framework itself

use axum::{
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use hyper::ext::ReasonPhrase;
use serde::Serialize;

use crate::model::ResponseRecord;
use crate::service::ServiceError;

/// JSON error body returned by every failing route.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::NotReplayable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ServiceError::Store(err) => {
                tracing::error!(error = %err, "Table store call failed");
                format!("Internal server error: {}", err)
            }
            other => {
                tracing::debug!(status = %status, error = %other, "Request rejected");
                other.to_string()
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Render a record as a live HTTP response.
///
/// String bodies are sent as plain text, anything else (null included) as
/// JSON. Stored headers are added unless the name is blank, invalid or
/// already present; each cookie becomes a `Set-Cookie` header.
///
/// Informational (1xx) statuses cannot end an exchange, so such records are
/// refused with [`ServiceError::NotReplayable`].
pub fn replay(record: &ResponseRecord) -> Result<Response, ServiceError> {
    let status = StatusCode::from_u16(record.status_code).unwrap_or(StatusCode::OK);
    if status.is_informational() {
        return Err(ServiceError::NotReplayable {
            id: record.id.clone(),
            status_code: record.status_code,
        });
    }

    let mut response = match &record.body {
        serde_json::Value::String(text) => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            text.clone(),
        )
            .into_response(),
        other => Json(other.clone()).into_response(),
    };
    *response.status_mut() = status;

    if let Ok(reason) = ReasonPhrase::try_from(record.reason_phrase.as_bytes()) {
        response.extensions_mut().insert(reason);
    }

    for (name, value) in record.headers.iter().flatten() {
        if name.trim().is_empty() {
            continue;
        }
        let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) else {
            tracing::warn!(id = %record.id, header = %name, "Skipping invalid stored header");
            continue;
        };
        if !response.headers().contains_key(&name) {
            response.headers_mut().insert(name, value);
        }
    }

    for (name, value) in record.cookies.iter().flatten() {
        match HeaderValue::from_str(&format!("{}={}", name, value)) {
            Ok(cookie) => {
                response.headers_mut().append(header::SET_COOKIE, cookie);
            }
            Err(_) => {
                tracing::warn!(id = %record.id, cookie = %name, "Skipping invalid stored cookie");
            }
        }
    }

    Ok(response)
}
