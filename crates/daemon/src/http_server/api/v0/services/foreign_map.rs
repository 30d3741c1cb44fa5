//! Foreign maps: fields other users shared with us, attached to one of our
//! origins.

use axum::extract::{Json, Path, State};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::identity::ForeignMapping;
use common::manager::ResolvedForeignMap;

use crate::http_server::api::client::{endpoint, ApiError, ApiRequest};
use crate::http_server::api::v0::{Envelope, RequestError};
use crate::ServiceState;

/// Show the decrypted foreign fields of an origin, keyed by uid then field name
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct ForeignMapRequest {
    /// Origin of the service
    pub origin: String,
}

/// Attach another user's shared field to an origin
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct AddMappingRequest {
    /// Origin of the service
    #[serde(skip)]
    pub origin: String,
    /// Owner of the shared field
    pub username: String,
    /// The owner's identity uid
    pub uid: String,
    /// The owner's field name
    pub field_name: String,
}

/// Detach a foreign field from an origin
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct RemoveMappingRequest {
    /// Origin of the service
    #[serde(skip)]
    pub origin: String,
    /// Owner of the shared field
    pub username: String,
    /// The owner's identity uid
    pub uid: String,
    /// The owner's field name
    pub field_name: String,
}

pub type MappingResponse = Vec<ForeignMapping>;

pub async fn get_handler(
    State(state): State<ServiceState>,
    Path(origin): Path<String>,
) -> Result<Envelope<ResolvedForeignMap>, RequestError> {
    let resolved = state.manager().resolve_foreign_map(&origin).await?;
    Ok(Envelope::success(resolved))
}

pub async fn add_handler(
    State(state): State<ServiceState>,
    Path(origin): Path<String>,
    Json(mapping): Json<ForeignMapping>,
) -> Result<Envelope<MappingResponse>, RequestError> {
    let entries = state
        .manager()
        .add_foreign_mapping(&origin, &mapping.uid, &mapping.field_name, &mapping.username)
        .await?;
    Ok(Envelope::success(entries))
}

pub async fn remove_handler(
    State(state): State<ServiceState>,
    Path(origin): Path<String>,
    Json(mapping): Json<ForeignMapping>,
) -> Result<Envelope<MappingResponse>, RequestError> {
    let entries = state
        .manager()
        .remove_foreign_mapping(&origin, &mapping.uid, &mapping.field_name, &mapping.username)
        .await?;
    Ok(Envelope::success(entries))
}

impl ApiRequest for ForeignMapRequest {
    type Response = ResolvedForeignMap;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let url = endpoint(base_url, &["services", &self.origin, "foreign_map"])?;
        Ok(client.get(url))
    }
}

impl ApiRequest for AddMappingRequest {
    type Response = MappingResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let url = endpoint(base_url, &["services", &self.origin, "foreign_map"])?;
        Ok(client.post(url).json(&self))
    }
}

impl ApiRequest for RemoveMappingRequest {
    type Response = MappingResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let url = endpoint(base_url, &["services", &self.origin, "foreign_map"])?;
        Ok(client.delete(url).json(&self))
    }
}
