use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;
use http::StatusCode;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::identity::Identity;

use crate::http_server::api::client::{endpoint, ApiError, ApiRequest};
use crate::http_server::api::v0::{Envelope, RequestError};
use crate::ServiceState;

/// Store a new identity under an existing service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIdentityRequest {
    #[serde(skip)]
    pub origin: String,
    #[serde(skip)]
    pub uid: String,
    #[serde(flatten)]
    pub identity: Identity,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Path((origin, uid)): Path<(String, String)>,
    Json(identity): Json<Identity>,
) -> Result<impl IntoResponse, RequestError> {
    state
        .manager()
        .create_service_identity(&origin, &uid, &identity)
        .await?;

    tracing::info!(origin = %origin, uid = %uid, "identity created");
    Ok((StatusCode::CREATED, Envelope::<()>::empty()))
}

impl ApiRequest for CreateIdentityRequest {
    type Response = ();

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let url = endpoint(base_url, &["services", &self.origin, "identities", &self.uid])?;
        Ok(client.post(url).json(&self))
    }
}
