//! HTTP error responses.
//!
//! Operation errors become `{"error": message}` with a status derived from
//! the error kind.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use m365_core::Error;
use serde_json::json;

/// An error returned from an HTTP route.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Op(#[from] Error),

    /// Graph answered a user-delegated call with an error; passed through as-is.
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    /// Delegated sign-in is not configured or failed.
    #[error("{0}")]
    SignIn(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Op(Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Op(Error::AuthFailed(_)) => StatusCode::UNAUTHORIZED,
            ApiError::Op(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream { status, .. } => *status,
            ApiError::SignIn(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        } else {
            tracing::warn!(%status, error = %self, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
