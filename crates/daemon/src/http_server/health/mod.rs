use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::version::build_info;
use crate::ServiceState;

mod readiness;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/livez", get(livez_handler))
        .route("/readyz", get(readiness::handler))
        .route("/identity", get(identity_handler))
        .route("/version", get(version_handler))
        .with_state(state)
}

pub async fn livez_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// The store user the daemon acts as
pub async fn identity_handler(State(state): State<ServiceState>) -> impl IntoResponse {
    Json(serde_json::json!({"username": state.manager().username()}))
}

pub async fn version_handler() -> impl IntoResponse {
    Json(build_info())
}
