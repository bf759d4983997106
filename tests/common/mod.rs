//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use return_response::config::{ServiceConfig, StorageBackend};
use return_response::lifecycle::{bootstrap, Shutdown};
use return_response::service::ResponseService;
use return_response::store::{StoreError, StoreErrorReason, StoreOperation, TableEntity, TableStore};
use return_response::HttpServer;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A running server and the handle that stops it.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server task to finish.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
    }
}

/// Config for an in-memory server on an ephemeral local port.
pub fn memory_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.storage.backend = StorageBackend::Memory;
    config
}

/// Bootstrap a server from `config` and serve it in the background.
pub async fn start_server(config: ServiceConfig) -> TestServer {
    let bind_address = config.listener.bind_address.clone();
    let server = bootstrap(config).await.unwrap();
    serve(server, &bind_address).await
}

/// Serve a server whose response service is backed by `store`.
#[allow(dead_code)]
pub async fn start_server_with_store(store: Arc<dyn TableStore>) -> TestServer {
    let config = memory_config();
    let bind_address = config.listener.bind_address.clone();
    let service = ResponseService::new(store, config.storage.partition_key.clone());
    serve(HttpServer::new(config, service), &bind_address).await
}

async fn serve(server: HttpServer, bind_address: &str) -> TestServer {
    let listener = TcpListener::bind(bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer {
        addr,
        shutdown,
        handle,
    }
}

/// Client without connection pooling or proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Store whose every call fails as an unreachable table would.
#[allow(dead_code)]
pub struct UnavailableStore;

impl UnavailableStore {
    fn fail(row_key: &str, operation: StoreOperation) -> StoreError {
        StoreError::new(
            row_key,
            operation,
            StoreErrorReason::BackendFailure("table unavailable".into()),
        )
    }
}

#[async_trait]
impl TableStore for UnavailableStore {
    async fn ensure_table(&self) -> Result<(), StoreError> {
        Err(Self::fail("", StoreOperation::EnsureTable))
    }

    async fn insert(&self, entity: TableEntity) -> Result<(), StoreError> {
        Err(Self::fail(&entity.row_key, StoreOperation::Insert))
    }

    async fn query_row_key(&self, row_key: &str) -> Result<Vec<TableEntity>, StoreError> {
        Err(Self::fail(row_key, StoreOperation::Query))
    }

    async fn upsert(&self, entity: TableEntity) -> Result<(), StoreError> {
        Err(Self::fail(&entity.row_key, StoreOperation::Upsert))
    }

    async fn delete(&self, _partition_key: &str, row_key: &str) -> Result<(), StoreError> {
        Err(Self::fail(row_key, StoreOperation::Delete))
    }
}
