//! Shared helpers for driving the daemon router in-process
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::Router;
use http::{header, Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

use ::common::manager::{Manager, ManagerConfig};
use ::common::store::{MemoryBackend, MemoryRemoteStore};
use paranoid_daemon::http_server::api::client::endpoint;
use paranoid_daemon::ServiceState;

pub const ORIGIN: &str = "http://a.com:80";

pub struct TestDaemon {
    pub router: Router,
    pub store: MemoryRemoteStore,
}

/// A daemon acting as `username` against a world shared through `backend`
pub async fn daemon(backend: &MemoryBackend, username: &str) -> TestDaemon {
    let store = backend.client(username);
    let manager = Manager::new(Arc::new(store.clone()), ManagerConfig::default());
    manager.init_layout().await.unwrap();

    let router = paranoid_daemon::http_server::router(ServiceState::from_manager(manager));
    TestDaemon { router, store }
}

/// Path and query of `/api/v0/<segments..>`, with segments percent-encoded
pub fn api_path(segments: &[&str]) -> String {
    let base = Url::parse("http://localhost").unwrap();
    endpoint(&base, segments).unwrap().path().to_string()
}

impl TestDaemon {
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(header::ACCEPT, "application/json");
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, segments: &[&str]) -> (StatusCode, Value) {
        self.request(Method::GET, &api_path(segments), None).await
    }

    pub async fn post(&self, segments: &[&str], body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, &api_path(segments), Some(body))
            .await
    }

    pub async fn delete(&self, segments: &[&str], body: Value) -> (StatusCode, Value) {
        self.request(Method::DELETE, &api_path(segments), Some(body))
            .await
    }

    /// Service at [`ORIGIN`] with identity "1" declaring `first_name` and `email`
    pub async fn seed_identity(&self) {
        let (status, _) = self
            .post(&["services", ORIGIN], serde_json::json!({"name": "A"}))
            .await;
        assert_eq!(status, StatusCode::OK);

        let identity = serde_json::json!({
            "key": "MIIC-test-key",
            "fields": {
                "first_name": {"type": "str", "shared_with": []},
                "email": {"type": "str", "shared_with": []}
            }
        });
        let (status, _) = self
            .post(&["services", ORIGIN, "identities", "1"], identity)
            .await;
        assert_eq!(status, StatusCode::CREATED);

        for (field, value) in [("first_name", "Irvin"), ("email", "irvin@a.com")] {
            let (status, _) = self
                .post(
                    &["services", ORIGIN, "identities", "1", field],
                    serde_json::json!({ "value": value }),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
        }
    }
}
