use axum::extract::{Json, Path, State};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::http_server::api::client::{endpoint, ApiError, ApiRequest};
use crate::http_server::api::v0::{Envelope, RequestError};
use crate::ServiceState;

/// Set the value of a declared field. The value is encrypted for whoever
/// the field is currently shared with.
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct PutFieldRequest {
    /// Origin of the service
    #[serde(skip)]
    pub origin: String,
    /// Identity uid
    #[serde(skip)]
    pub uid: String,
    /// Field name, as declared by the identity
    #[serde(skip)]
    pub field_name: String,
    /// Plaintext value
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct PutFieldBody {
    pub value: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Path((origin, uid, field_name)): Path<(String, String, String)>,
    Json(body): Json<PutFieldBody>,
) -> Result<Envelope<()>, RequestError> {
    state
        .manager()
        .put_field_value(&origin, &uid, &field_name, &body.value)
        .await?;
    Ok(Envelope::empty())
}

impl ApiRequest for PutFieldRequest {
    type Response = ();

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let url = endpoint(
            base_url,
            &[
                "services",
                &self.origin,
                "identities",
                &self.uid,
                &self.field_name,
            ],
        )?;
        Ok(client.post(url).json(&self))
    }
}
