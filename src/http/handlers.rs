//! Route handlers for the response resource.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::Serialize;

use crate::http::response::replay;
use crate::http::server::AppState;
use crate::model::{ResponsePayload, ResponseRecord};
use crate::service::ServiceError;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

pub async fn health() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

/// `POST /{resource}`
pub async fn create_response(
    State(state): State<AppState>,
    Json(payload): Json<ResponsePayload>,
) -> Result<Json<ResponseRecord>, ServiceError> {
    state.service.create(payload).await.map(Json)
}

/// `GET /{resource}/{id}`
pub async fn get_response(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResponseRecord>, ServiceError> {
    state.service.read(&id).await.map(Json)
}

/// `PUT /{resource}/{id}`
pub async fn put_response(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ResponsePayload>,
) -> Result<Json<ResponseRecord>, ServiceError> {
    state.service.update(&id, payload).await.map(Json)
}

/// `DELETE /{resource}/{id}`
pub async fn delete_response(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    state.service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /{resource}/{id}/replay`
pub async fn replay_response(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let record = state.service.read(&id).await?;
    replay(&record)
}
