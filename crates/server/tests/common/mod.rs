//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! backed by a temporary SQLite store and a mock remote catalog, so the
//! whole cache-aside path can be exercised without network access.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use gamedex_core::{
    config::{DatabaseConfig, ServerConfig},
    testing::MockRemoteCatalog,
    BulkImporter, CacheAsideResolver, Config, GameStore, ImportManager, RawgConfig,
    RemoteCatalog, SqliteGameStore, SyncSettings, WatchlistStore,
};
use gamedex_server::{create_router, AppState};

/// Re-export fixtures for test convenience
pub use gamedex_core::testing::fixtures;

/// Test fixture for API testing with a mock remote catalog.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_search() {
///     let fixture = TestFixture::new().await;
///     fixture.remote.set_records(fixtures::raw_records(1..=3)).await;
///
///     let response = fixture.get("/api/v1/games/search?query=game").await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock remote catalog - configure RAWG responses
    pub remote: Arc<MockRemoteCatalog>,
    /// Direct handle on the store the server uses
    pub store: Arc<dyn GameStore>,
    /// Temporary directory holding the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with a mock remote catalog.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let remote = Arc::new(MockRemoteCatalog::new());

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            rawg: test_config.with_remote.then(|| RawgConfig {
                api_key: "test-key".to_string(),
                base_url: None,
                timeout_secs: 5,
            }),
            ..Default::default()
        };

        let sqlite = Arc::new(SqliteGameStore::new(&db_path).expect("Failed to create game store"));
        let store: Arc<dyn GameStore> = Arc::clone(&sqlite) as Arc<dyn GameStore>;
        let watchlists: Arc<dyn WatchlistStore> = sqlite;

        let settings = SyncSettings {
            stale_after: test_config.stale_after,
            remote_timeout: Duration::from_secs(2),
            import_page_size: 10,
        };

        let remote_dyn: Option<Arc<dyn RemoteCatalog>> = test_config
            .with_remote
            .then(|| Arc::clone(&remote) as Arc<dyn RemoteCatalog>);

        let resolver =
            CacheAsideResolver::new(Arc::clone(&store), remote_dyn.clone(), settings.clone());
        let imports = remote_dyn.map(|remote| {
            ImportManager::new(BulkImporter::new(Arc::clone(&store), remote, settings))
        });

        let state = Arc::new(AppState::new(config, resolver, watchlists, imports));
        let router = create_router(state);

        Self {
            router,
            remote,
            store,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a GET request and return the raw body as text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&body_bytes).into_owned())
    }

    /// Poll the import status until the job is no longer running.
    pub async fn wait_for_import(&self) -> TestResponse {
        for _ in 0..100 {
            let response = self.get("/api/v1/games/import").await;
            if response.body["running"] == false {
                return response;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("Import did not finish in time");
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Wire the mock remote catalog into the server
    pub with_remote: bool,
    /// Staleness window for synced games
    pub stale_after: Duration,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            with_remote: true,
            stale_after: Duration::from_secs(3600),
        }
    }
}

impl TestConfig {
    /// Create config for a server with no remote catalog.
    pub fn local_only() -> Self {
        Self {
            with_remote: false,
            ..Default::default()
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
