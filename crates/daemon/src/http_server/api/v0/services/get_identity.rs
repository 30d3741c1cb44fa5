use axum::extract::{Path, State};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::identity::ResolvedIdentity;

use crate::http_server::api::client::{endpoint, ApiError, ApiRequest};
use crate::http_server::api::v0::{Envelope, RequestError};
use crate::ServiceState;

/// Show an identity with every field value you can read
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct GetIdentityRequest {
    /// Origin of the service
    pub origin: String,
    /// Identity uid
    pub uid: String,
}

/// `None` when the identity does not exist
pub type GetIdentityResponse = Option<ResolvedIdentity>;

pub async fn handler(
    State(state): State<ServiceState>,
    Path((origin, uid)): Path<(String, String)>,
) -> Result<Envelope<ResolvedIdentity>, RequestError> {
    let resolved = state.manager().resolve_identity(&origin, &uid).await?;
    Ok(resolved.into())
}

impl ApiRequest for GetIdentityRequest {
    type Response = GetIdentityResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let url = endpoint(base_url, &["services", &self.origin, "identities", &self.uid])?;
        Ok(client.get(url))
    }
}
