use axum::extract::{Json, Path, State};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use common::identity::ServiceInfo;

use crate::http_server::api::client::{endpoint, ApiError, ApiRequest};
use crate::http_server::api::v0::{Envelope, RequestError};
use crate::ServiceState;

/// Create or replace a service. The body is the service info; its `origin`
/// member, if any, is overridden by the path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutRequest {
    #[serde(skip)]
    pub origin: String,
    #[serde(flatten)]
    pub info: Map<String, Value>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Path(origin): Path<String>,
    Json(mut info): Json<Map<String, Value>>,
) -> Result<Envelope<()>, RequestError> {
    info.remove("origin");
    let info = ServiceInfo {
        origin: origin.clone(),
        extra: info,
    };

    state.manager().put_service(&origin, info).await?;
    Ok(Envelope::empty())
}

impl ApiRequest for PutRequest {
    type Response = ();

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let url = endpoint(base_url, &["services", &self.origin])?;
        Ok(client.post(url).json(&self))
    }
}
