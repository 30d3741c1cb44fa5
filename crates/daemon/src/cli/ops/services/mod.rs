use clap::{Args, Subcommand};
use serde::Serialize;

pub mod read;
pub mod write;

use crate::cli::op::{Op, OpContext};
use paranoid_daemon::http_server::api::client::{ApiError, ApiRequest};
use paranoid_daemon::http_server::api::v0::services::{
    AddMappingRequest, ForeignMapRequest, GetIdentityRequest, GetRequest, ListRequest,
    PutFieldRequest, RemoveMappingRequest, ShareRequest, UnshareRequest,
};

crate::command_enum! {
    (List, ListRequest),
    (Get, GetRequest),
    (Put, write::Put),
    (Identity, GetIdentityRequest),
    (CreateIdentity, write::CreateIdentity),
    (SetField, PutFieldRequest),
    (Share, ShareRequest),
    (Unshare, UnshareRequest),
    (ForeignMap, ForeignMapRequest),
    (AddMapping, AddMappingRequest),
    (RemoveMapping, RemoveMappingRequest),
}

// Rename the generated Command to ServicesCommand for clarity
pub type ServicesCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Services {
    #[command(subcommand)]
    pub command: ServicesCommand,
}

#[async_trait::async_trait]
impl Op for Services {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServicesError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Send `request` and pretty-print whatever comes back.
pub(crate) async fn call_pretty<R>(ctx: &OpContext, request: R) -> Result<String, ServicesError>
where
    R: ApiRequest + Send,
    R::Response: Serialize + Send,
{
    let response = ctx.client.call(request).await?;
    Ok(serde_json::to_string_pretty(&response)?)
}
