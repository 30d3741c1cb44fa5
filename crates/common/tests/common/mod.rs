//! Shared test utilities for manager integration tests
#![allow(dead_code)]

use std::sync::Arc;

use ::common::identity::{Identity, ServiceInfo};
use ::common::manager::{Manager, ManagerConfig};
use ::common::store::{MemoryBackend, MemoryRemoteStore};

pub const ORIGIN: &str = "http://a.com:80";

/// One user of a shared in-memory world
pub struct TestUser {
    pub manager: Manager,
    pub store: MemoryRemoteStore,
}

pub fn user(backend: &MemoryBackend, username: &str) -> TestUser {
    user_with_config(backend, username, ManagerConfig::default())
}

pub fn user_with_config(
    backend: &MemoryBackend,
    username: &str,
    config: ManagerConfig,
) -> TestUser {
    let store = backend.client(username);
    let manager = Manager::new(Arc::new(store.clone()), config);
    TestUser { manager, store }
}

/// A world with alice and bob, both with an initialized layout
pub async fn setup_test_env() -> (MemoryBackend, TestUser, TestUser) {
    let backend = MemoryBackend::new();
    let alice = user(&backend, "alice");
    let bob = user(&backend, "bob");
    alice.manager.init_layout().await.unwrap();
    bob.manager.init_layout().await.unwrap();
    (backend, alice, bob)
}

/// Give `user` a service at [`ORIGIN`] with identity "1" declaring
/// `first_name` and `email`, both holding a value only the owner can read.
pub async fn seed_identity(user: &TestUser) -> Identity {
    let manager = &user.manager;
    manager
        .put_service(ORIGIN, ServiceInfo::new(ORIGIN))
        .await
        .unwrap();

    let identity = Identity::new("MIIC-test-key")
        .with_field("first_name", "str")
        .with_field("email", "str");
    manager
        .set_service_identity(ORIGIN, "1", &identity)
        .await
        .unwrap();

    manager
        .put_field_value(ORIGIN, "1", "first_name", "Irvin")
        .await
        .unwrap();
    manager
        .put_field_value(ORIGIN, "1", "email", "irvin@a.com")
        .await
        .unwrap();

    identity
}
