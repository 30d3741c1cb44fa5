mod common;

use ::common::store::MemoryBackend;
use http::{Method, StatusCode};
use serde_json::json;

use crate::common::{daemon, ORIGIN};

#[tokio::test]
async fn test_services_round_trip() {
    let backend = MemoryBackend::new();
    let alice = daemon(&backend, "alice").await;

    let (status, body) = alice.get(&["services"]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success", "data": []}));

    alice.seed_identity().await;

    let (_, body) = alice.get(&["services"]).await;
    assert_eq!(body["data"], json!([ORIGIN]));

    let (status, body) = alice.get(&["services", ORIGIN]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["info"]["origin"], ORIGIN);
    assert_eq!(body["data"]["info"]["name"], "A");
    assert_eq!(body["data"]["uids"], json!(["1"]));
}

#[tokio::test]
async fn test_missing_items_are_empty_success() {
    let backend = MemoryBackend::new();
    let alice = daemon(&backend, "alice").await;

    let (status, body) = alice.get(&["services", ORIGIN]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success"}));

    let (status, body) = alice.get(&["services", ORIGIN, "identities", "9"]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success"}));
}

#[tokio::test]
async fn test_get_identity_resolves_fields() {
    let backend = MemoryBackend::new();
    let alice = daemon(&backend, "alice").await;
    alice.seed_identity().await;

    let (status, body) = alice.get(&["services", ORIGIN, "identities", "1"]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["key"], "MIIC-test-key");
    assert_eq!(
        body["data"]["map"],
        json!({"first_name": "Irvin", "email": "irvin@a.com"})
    );
}

#[tokio::test]
async fn test_create_identity_twice_is_rejected() {
    let backend = MemoryBackend::new();
    let alice = daemon(&backend, "alice").await;
    alice.seed_identity().await;

    let (status, body) = alice
        .post(
            &["services", ORIGIN, "identities", "1"],
            json!({"key": "other", "fields": {}}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(body["error"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn test_create_identity_without_service_is_rejected() {
    let backend = MemoryBackend::new();
    let alice = daemon(&backend, "alice").await;

    let (status, body) = alice
        .post(
            &["services", ORIGIN, "identities", "1"],
            json!({"key": "k", "fields": {}}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("service does not exist"));
}

#[tokio::test]
async fn test_put_undeclared_field_is_rejected() {
    let backend = MemoryBackend::new();
    let alice = daemon(&backend, "alice").await;
    alice.seed_identity().await;

    let (status, body) = alice
        .post(
            &["services", ORIGIN, "identities", "1", "phone"],
            json!({"value": "555"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_share_then_foreign_map() {
    let backend = MemoryBackend::new();
    let alice = daemon(&backend, "alice").await;
    let bob = daemon(&backend, "bob").await;
    alice.seed_identity().await;

    let (status, body) = alice
        .post(
            &["services", ORIGIN, "identities", "1", "email", "share"],
            json!({"username": "bob"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["fields"]["email"]["shared_with"], json!(["bob"]));

    // Sharing twice is a precondition failure
    let (status, _) = alice
        .post(
            &["services", ORIGIN, "identities", "1", "email", "share"],
            json!({"username": "bob"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = bob
        .post(
            &["services", ORIGIN, "foreign_map"],
            json!({"username": "alice", "uid": "1", "field_name": "email"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!([{"username": "alice", "uid": "1", "field_name": "email"}])
    );

    let (status, body) = bob.get(&["services", ORIGIN, "foreign_map"]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"1": {"email": "irvin@a.com"}}));

    let (status, body) = bob
        .delete(
            &["services", ORIGIN, "foreign_map"],
            json!({"username": "alice", "uid": "1", "field_name": "email"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_unshare_unknown_user_is_rejected() {
    let backend = MemoryBackend::new();
    let alice = daemon(&backend, "alice").await;
    alice.seed_identity().await;

    let (status, body) = alice
        .post(
            &["services", ORIGIN, "identities", "1", "email", "unshare"],
            json!({"username": "carol"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("not shared"));
}

#[tokio::test]
async fn test_store_failure_is_server_error() {
    let backend = MemoryBackend::new();
    let alice = daemon(&backend, "alice").await;
    alice.store.set_offline(true);

    let (status, body) = alice.get(&["services"]).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_status_routes() {
    let backend = MemoryBackend::new();
    let alice = daemon(&backend, "alice").await;

    let (status, body) = alice.request(Method::GET, "/_status/livez", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = alice.request(Method::GET, "/_status/readyz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (_, body) = alice.request(Method::GET, "/_status/identity", None).await;
    assert_eq!(body["username"], "alice");

    let (_, body) = alice.request(Method::GET, "/_status/version", None).await;
    assert!(body["package_version"].is_string());
}

#[tokio::test]
async fn test_unknown_route_is_json_not_found() {
    let backend = MemoryBackend::new();
    let alice = daemon(&backend, "alice").await;

    let (status, body) = alice.request(Method::GET, "/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"status": "error", "error": "not found"}));
}

#[tokio::test]
async fn test_option_like_username_is_rejected() {
    let backend = MemoryBackend::new();
    let alice = daemon(&backend, "alice").await;
    alice.seed_identity().await;

    let (status, body) = alice
        .post(
            &["services", ORIGIN, "identities", "1", "email", "share"],
            json!({"username": "--infile=/home/alice/.ssh/id_rsa"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("invalid username"));
    assert!(backend.notifications().is_empty());
}
