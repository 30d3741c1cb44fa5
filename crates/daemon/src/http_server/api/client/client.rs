use reqwest::{header::HeaderMap, header::HeaderValue, Client};
use serde_json::Value;
use url::Url;

use super::error::ApiError;
use super::ApiRequest;
use crate::http_server::api::v0::Envelope;

#[derive(Debug, Clone)]
pub struct ApiClient {
    pub remote: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(remote: &Url) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        default_headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    /// Send `request` and unwrap the reply envelope.
    pub async fn call<T: ApiRequest>(&self, request: T) -> Result<T::Response, ApiError> {
        let request_builder = request.build_request(&self.remote, &self.client)?;
        let response = request_builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<Envelope<Value>>(&body) {
            Ok(Envelope::Success { data }) if status.is_success() => {
                Ok(serde_json::from_value(data.unwrap_or(Value::Null))?)
            }
            Ok(Envelope::Error { error }) => Err(ApiError::HttpStatus(status, error)),
            _ => Err(ApiError::HttpStatus(status, body)),
        }
    }

    /// Get the base URL for API requests
    pub fn base_url(&self) -> &Url {
        &self.remote
    }

    /// Get the underlying HTTP client for custom requests
    pub fn http_client(&self) -> &Client {
        &self.client
    }
}
