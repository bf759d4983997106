//! Return Response Service Library

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod model;
pub mod observability;
pub mod secrets;
pub mod service;
pub mod store;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use model::{ResponsePayload, ResponseRecord};
pub use service::{ResponseService, ServiceError};
