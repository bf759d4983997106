//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the record routes and health check
//! - Wire up middleware (request ID, tracing, body limit, metrics)
//! - Bind server to listener
//! - Stop accepting on the shutdown signal and drain in-flight requests

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::http::handlers::{
    create_response, delete_response, get_response, health, put_response, replay_response,
};
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::observability::metrics;
use crate::service::ResponseService;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: ResponseService,
}

/// HTTP server for the response store.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server serving `service`.
    pub fn new(config: ServiceConfig, service: ResponseService) -> Self {
        let state = AppState { service };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let collection = format!("/{}", config.api.resource);
        let item = format!("{}/{{id}}", collection);
        let replay = format!("{}/replay", item);

        Router::new()
            .route("/health", get(health))
            .route(&collection, post(create_response))
            .route(
                &item,
                get(get_response).put(put_response).delete(delete_response),
            )
            .route(&replay, get(replay_response))
            .with_state(state)
            .layer(middleware::from_fn(metrics::track_requests))
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(set_request_id_layer())
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until a shutdown signal is broadcast.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            resource = %self.config.api.resource,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}
