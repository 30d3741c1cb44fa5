use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

#[allow(clippy::module_inception)]
mod client;
mod error;

pub use client::ApiClient;
pub use error::ApiError;

/// A request the CLI can send to a running daemon.
///
/// Each handler module implements this next to its server side so both ends
/// agree on paths and payloads.
pub trait ApiRequest {
    /// What the `data` member of a successful reply decodes to. Replies
    /// without data decode from `null`, so this is usually an `Option` or `()`
    type Response: DeserializeOwned;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError>;
}

/// `<base>/api/v0/<segments..>`, each segment percent-encoded
pub fn endpoint(base_url: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base_url.join("/api/v0/")?;
    url.path_segments_mut()
        .map_err(|_| ApiError::InvalidBase(base_url.clone()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_segments() {
        let base = Url::parse("http://localhost:5000").unwrap();
        let url = endpoint(&base, &["services", "http://a.com:80", "identities", "1"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/v0/services/http:%2F%2Fa.com:80/identities/1"
        );
    }

    #[test]
    fn test_endpoint_rejects_opaque_base() {
        let base = Url::parse("mailto:irvin@a.com").unwrap();
        assert!(endpoint(&base, &["services"]).is_err());
    }
}
