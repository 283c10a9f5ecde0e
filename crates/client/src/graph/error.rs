//! Graph API client error types.

use std::sync::Arc;

use crate::auth::AuthError;

/// Errors from the Graph REST client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GraphError {
    /// No bearer token could be acquired.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Graph answered with a non-success status.
    #[error("HTTP error {status}: {body}")]
    Status { status: u16, body: String },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl GraphError {
    /// HTTP status for `Status` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            GraphError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GraphError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { GraphError::Timeout } else { GraphError::Network(Arc::new(err)) }
    }
}

impl From<GraphError> for m365_core::Error {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Auth(e) => e.into(),
            GraphError::Status { status, body } => m365_core::Error::Graph { status, message: body },
            other => m365_core::Error::HttpError(other.to_string()),
        }
    }
}
