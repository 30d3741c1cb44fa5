use axum::extract::State;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::http_server::api::client::{endpoint, ApiError, ApiRequest};
use crate::http_server::api::v0::{Envelope, RequestError};
use crate::ServiceState;

/// List every origin with a stored service
#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
pub struct ListRequest {}

pub type ListResponse = Vec<String>;

pub async fn handler(
    State(state): State<ServiceState>,
) -> Result<Envelope<ListResponse>, RequestError> {
    let origins = state.manager().list_origins().await?;
    Ok(Envelope::success(origins))
}

impl ApiRequest for ListRequest {
    type Response = ListResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        Ok(client.get(endpoint(base_url, &["services"])?))
    }
}
