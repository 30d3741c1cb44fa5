use axum::extract::{Json, Path, State};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::identity::Identity;

use crate::http_server::api::client::{endpoint, ApiError, ApiRequest};
use crate::http_server::api::v0::{Envelope, RequestError};
use crate::ServiceState;

/// Grant another user read access to a field
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct ShareRequest {
    /// Origin of the service
    #[serde(skip)]
    pub origin: String,
    /// Identity uid
    #[serde(skip)]
    pub uid: String,
    /// Field to share
    #[serde(skip)]
    pub field_name: String,
    /// Keybase user to share with
    pub username: String,
}

/// Revoke a user's read access to a field
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct UnshareRequest {
    /// Origin of the service
    #[serde(skip)]
    pub origin: String,
    /// Identity uid
    #[serde(skip)]
    pub uid: String,
    /// Field to stop sharing
    #[serde(skip)]
    pub field_name: String,
    /// Keybase user to revoke
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct UsernameBody {
    pub username: String,
}

pub async fn share_handler(
    State(state): State<ServiceState>,
    Path((origin, uid, field_name)): Path<(String, String, String)>,
    Json(body): Json<UsernameBody>,
) -> Result<Envelope<Identity>, RequestError> {
    let identity = state
        .manager()
        .share(&origin, &uid, &field_name, &body.username)
        .await?;
    Ok(Envelope::success(identity))
}

pub async fn unshare_handler(
    State(state): State<ServiceState>,
    Path((origin, uid, field_name)): Path<(String, String, String)>,
    Json(body): Json<UsernameBody>,
) -> Result<Envelope<Identity>, RequestError> {
    let identity = state
        .manager()
        .unshare(&origin, &uid, &field_name, &body.username)
        .await?;
    Ok(Envelope::success(identity))
}

fn sharing_endpoint(
    base_url: &Url,
    origin: &str,
    uid: &str,
    field_name: &str,
    action: &str,
) -> Result<Url, ApiError> {
    endpoint(
        base_url,
        &["services", origin, "identities", uid, field_name, action],
    )
}

impl ApiRequest for ShareRequest {
    type Response = Identity;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let url = sharing_endpoint(base_url, &self.origin, &self.uid, &self.field_name, "share")?;
        Ok(client.post(url).json(&self))
    }
}

impl ApiRequest for UnshareRequest {
    type Response = Identity;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let url = sharing_endpoint(
            base_url,
            &self.origin,
            &self.uid,
            &self.field_name,
            "unshare",
        )?;
        Ok(client.post(url).json(&self))
    }
}
