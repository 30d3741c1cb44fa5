use axum::extract::{Path, State};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::identity::ServiceInfo;

use crate::http_server::api::client::{endpoint, ApiError, ApiRequest};
use crate::http_server::api::v0::{Envelope, RequestError};
use crate::ServiceState;

/// Show a service and the uids stored under it
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct GetRequest {
    /// Origin of the service, e.g. http://example.com:80
    pub origin: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResponse {
    pub info: ServiceInfo,
    pub uids: Vec<String>,
}

/// `None` when no service exists for the origin
pub type GetResponse = Option<ServiceResponse>;

pub async fn handler(
    State(state): State<ServiceState>,
    Path(origin): Path<String>,
) -> Result<Envelope<ServiceResponse>, RequestError> {
    let manager = state.manager();
    let Some(info) = manager.get_service(&origin).await? else {
        return Ok(Envelope::empty());
    };
    let uids = manager.list_service_uids(&origin).await?;

    Ok(Envelope::success(ServiceResponse { info, uids }))
}

impl ApiRequest for GetRequest {
    type Response = GetResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        Ok(client.get(endpoint(base_url, &["services", &self.origin])?))
    }
}
