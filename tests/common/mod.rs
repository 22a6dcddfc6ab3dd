//! Shared test utilities for the integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
pub use conduit::{
    ClientConfig, ErrorCode, HttpEngine, Method, RequestSpec, TransactionHandle,
    TransactionManager, TransactionStatus, TransactionView, TransferOutcome,
};
use tokio::runtime::Runtime;

// ============================================================================
// Local server
// ============================================================================

/// A local axum server on its own runtime; stops when dropped.
///
/// Routes:
/// - `GET /`       → 200 with a short HTML body
/// - `GET /slow`   → 200 after ten seconds
/// - `POST /echo`  → 200 echoing the request body
///
/// Any other method on `/` answers 405.
pub struct TestServer {
    pub addr: SocketAddr,
    _runtime: Runtime,
}

impl TestServer {
    pub fn start() -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let listener = runtime
            .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
            .unwrap();
        let addr = listener.local_addr().unwrap();

        let app = Router::new()
            .route("/", get(|| async { "<html><body>conduit</body></html>" }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    "late"
                }),
            )
            .route("/echo", post(|body: String| async move { body }));
        runtime.spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            _runtime: runtime,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// A URL on a port with nothing listening.
pub fn refused_url() -> String {
    let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/", addr)
}

// ============================================================================
// Manager helpers
// ============================================================================

pub fn http_manager() -> Arc<TransactionManager<HttpEngine>> {
    http_manager_with(ClientConfig {
        worker_threads: 1,
        ..ClientConfig::default()
    })
}

pub fn http_manager_with(config: ClientConfig) -> Arc<TransactionManager<HttpEngine>> {
    Arc::new(TransactionManager::new(
        HttpEngine::with_config(&config).unwrap(),
    ))
}

/// Poll until all handles complete; panics after `limit`.
pub fn drive_all(
    manager: &TransactionManager<HttpEngine>,
    handles: &[TransactionHandle],
    limit: Duration,
) {
    assert!(
        manager.poll_until(handles, limit, Duration::from_millis(2)),
        "transactions still pending after {:?}",
        limit
    );
}
