use paranoid_daemon::http_server::api::v0::services::{
    ForeignMapRequest, GetIdentityRequest, GetRequest, ListRequest,
};

use super::{call_pretty, ServicesError};
use crate::cli::op::{Op, OpContext};

#[async_trait::async_trait]
impl Op for ListRequest {
    type Error = ServicesError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let origins = ctx.client.call(self.clone()).await?;
        if origins.is_empty() {
            return Ok("no services".to_string());
        }
        Ok(origins.join("\n"))
    }
}

#[async_trait::async_trait]
impl Op for GetRequest {
    type Error = ServicesError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        match ctx.client.call(self.clone()).await? {
            Some(service) => Ok(serde_json::to_string_pretty(&service)?),
            None => Ok(format!("no service for {}", self.origin)),
        }
    }
}

#[async_trait::async_trait]
impl Op for GetIdentityRequest {
    type Error = ServicesError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        match ctx.client.call(self.clone()).await? {
            Some(identity) => Ok(serde_json::to_string_pretty(&identity)?),
            None => Ok(format!("no identity {} for {}", self.uid, self.origin)),
        }
    }
}

#[async_trait::async_trait]
impl Op for ForeignMapRequest {
    type Error = ServicesError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        call_pretty(ctx, self.clone()).await
    }
}
