use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use common::manager::ParanoidError;

/// Every API reply: `{"status": "success", "data": ..}` or
/// `{"status": "error", "error": ".."}`. `data` is left out when there is
/// nothing to return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope<T> {
    Success {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<T>,
    },
    Error {
        error: String,
    },
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Envelope::Success { data: Some(data) }
    }

    pub fn empty() -> Self {
        Envelope::Success { data: None }
    }
}

impl<T> From<Option<T>> for Envelope<T> {
    fn from(data: Option<T>) -> Self {
        Envelope::Success { data }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let status = match self {
            Envelope::Success { .. } => StatusCode::OK,
            Envelope::Error { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error(transparent)]
    Paranoid(#[from] ParanoidError),
    #[error("{0}")]
    BadRequest(String),
}

impl RequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::Paranoid(e) if e.is_precondition() => StatusCode::BAD_REQUEST,
            RequestError::Paranoid(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RequestError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }

        let body: Envelope<()> = Envelope::Error {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
