use clap::Args;
use serde_json::{Map, Value};

use common::identity::Identity;
use paranoid_daemon::http_server::api::v0::services::{
    AddMappingRequest, CreateIdentityRequest, PutFieldRequest, PutRequest, RemoveMappingRequest,
    ShareRequest, UnshareRequest,
};

use super::{call_pretty, ServicesError};
use crate::cli::op::{Op, OpContext};

/// Create or replace a service
#[derive(Args, Debug, Clone)]
pub struct Put {
    /// Origin of the service, e.g. http://example.com:80
    pub origin: String,
    /// Extra service info as a JSON object
    #[arg(long, default_value = "{}")]
    pub info: String,
}

#[async_trait::async_trait]
impl Op for Put {
    type Error = ServicesError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let info: Map<String, Value> = serde_json::from_str(&self.info)?;
        let request = PutRequest {
            origin: self.origin.clone(),
            info,
        };
        ctx.client.call(request).await?;
        Ok(format!("service {} saved", self.origin))
    }
}

/// Store a new identity under an existing service
#[derive(Args, Debug, Clone)]
pub struct CreateIdentity {
    /// Origin of the service
    pub origin: String,
    /// Identity uid
    pub uid: String,
    /// The identity as JSON, e.g. '{"key": "..", "fields": {"email": {"type": "email"}}}'
    pub identity: String,
}

#[async_trait::async_trait]
impl Op for CreateIdentity {
    type Error = ServicesError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let identity: Identity = serde_json::from_str(&self.identity)?;
        let request = CreateIdentityRequest {
            origin: self.origin.clone(),
            uid: self.uid.clone(),
            identity,
        };
        ctx.client.call(request).await?;
        Ok(format!("identity {} created for {}", self.uid, self.origin))
    }
}

#[async_trait::async_trait]
impl Op for PutFieldRequest {
    type Error = ServicesError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        ctx.client.call(self.clone()).await?;
        Ok(format!("{} of {} updated", self.field_name, self.uid))
    }
}

#[async_trait::async_trait]
impl Op for ShareRequest {
    type Error = ServicesError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        call_pretty(ctx, self.clone()).await
    }
}

#[async_trait::async_trait]
impl Op for UnshareRequest {
    type Error = ServicesError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        call_pretty(ctx, self.clone()).await
    }
}

#[async_trait::async_trait]
impl Op for AddMappingRequest {
    type Error = ServicesError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        call_pretty(ctx, self.clone()).await
    }
}

#[async_trait::async_trait]
impl Op for RemoveMappingRequest {
    type Error = ServicesError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        call_pretty(ctx, self.clone()).await
    }
}
