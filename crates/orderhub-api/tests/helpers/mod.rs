//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use orderhub_api::{AppState, build_app};
use orderhub_cache::{CacheManager, keys};
use orderhub_core::config::AppConfig;
use orderhub_realtime::{Principal, RealtimeEngine};
use orderhub_worker::{JobQueue, RetryPolicy};

/// Shared secret configured for internal routes in tests.
pub const INTERNAL_SECRET: &str = "test-internal-secret";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// State shared with the router
    pub state: AppState,
}

impl TestApp {
    /// Create a new test application backed by in-memory stores
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.internal.shared_secret = INTERNAL_SECRET.to_string();

        let cache = CacheManager::in_memory();
        let queue = Arc::new(JobQueue::in_memory(RetryPolicy::default()));
        let realtime = RealtimeEngine::new(
            config.realtime.clone(),
            cache.clone(),
            Some(Arc::clone(&queue)),
        );

        let state = AppState::new(Arc::new(config), cache, realtime, queue);
        let router = build_app(state.clone());
        Self { router, state }
    }

    /// Store an admin session and return its bearer token
    pub async fn login(&self, user_id: i64, role: &str) -> String {
        let token = format!("session-{user_id}-{role}");
        self.state
            .cache
            .set_json(
                &keys::admin_session(&token),
                &Principal::new(user_id, role),
                Duration::from_secs(3600),
            )
            .await
            .expect("Failed to store session");
        token
    }

    /// Issue a connection ticket through the HTTP endpoint
    pub async fn ticket(&self, token: &str) -> String {
        let response = self
            .request("POST", "/api/realtime/ticket", None, Some(token))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.body["ticket"]
            .as_str()
            .expect("No ticket in response")
            .to_string()
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        self.send(req, body).await
    }

    /// Make a request to an internal route with the shared secret
    pub async fn internal_request(&self, path: &str, body: Value) -> TestResponse {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .header("x-internal-secret", INTERNAL_SECRET);
        self.send(req, Some(body)).await
    }

    async fn send(&self, req: axum::http::request::Builder, body: Option<Value>) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Serve the app on an ephemeral local port
    pub async fn spawn(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("No local addr");
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server failed");
        });
        addr
    }

    /// Wait until the registry holds `count` connections
    pub async fn wait_for_connections(&self, count: usize) {
        for _ in 0..200 {
            if self.state.realtime.connections.connection_count() == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Expected {count} connections");
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}
