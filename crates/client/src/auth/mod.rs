//! OAuth2 token acquisition for Microsoft Graph.
//!
//! - [`ClientCredentialsProvider`]: app-only tokens (`client_credentials`
//!   grant), cached in memory until shortly before expiry.
//! - [`DelegatedAuth`]: authorization URL and code exchange for the user
//!   sign-in flow.
//! - [`StaticToken`]: a pre-acquired token.
//! - [`Unconfigured`]: fails every request when app credentials are absent.

mod client_credentials;
mod delegated;

pub use client_credentials::ClientCredentialsProvider;
pub use delegated::{DELEGATED_SCOPES, DelegatedAuth, DelegatedToken};

use async_trait::async_trait;
use serde::Deserialize;

/// Scope requesting every application permission granted to the app.
pub const GRAPH_DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Errors from token acquisition.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    /// The token endpoint could not be reached.
    #[error("token request failed: {0}")]
    Request(String),

    /// The token endpoint rejected the request.
    #[error("token endpoint returned {status}: {description}")]
    Rejected { status: u16, description: String },

    /// The response carried no access token.
    #[error("no access token in token response")]
    MissingToken,

    /// No credentials are configured for this flow.
    #[error("credentials not configured: {0}")]
    NotConfigured(String),
}

impl From<AuthError> for m365_core::Error {
    fn from(err: AuthError) -> Self {
        m365_core::Error::AuthFailed(err.to_string())
    }
}

/// Source of bearer tokens for Graph requests.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a valid access token, acquiring a new one if needed.
    async fn access_token(&self) -> Result<String, AuthError>;
}

/// Provider for deployments without app-only credentials.
///
/// Every request fails with [`AuthError::NotConfigured`] carrying the hint.
#[derive(Debug, Clone)]
pub struct Unconfigured(pub String);

#[async_trait]
impl TokenProvider for Unconfigured {
    async fn access_token(&self) -> Result<String, AuthError> {
        Err(AuthError::NotConfigured(self.0.clone()))
    }
}

/// A fixed, pre-acquired token.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String, AuthError> {
        if self.0.is_empty() {
            return Err(AuthError::MissingToken);
        }
        Ok(self.0.clone())
    }
}

/// Token endpoint response, success or error shape.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Token endpoint for a tenant: `{authority}/{tenant}/oauth2/v2.0/token`.
pub(crate) fn token_url(authority: &str, tenant_id: &str) -> String {
    format!("{}/{}/oauth2/v2.0/token", authority.trim_end_matches('/'), tenant_id)
}

/// POST a token form and decode the response.
pub(crate) async fn request_token(
    http: &reqwest::Client, url: &str, form: &[(&str, &str)],
) -> Result<TokenResponse, AuthError> {
    let response = http
        .post(url)
        .form(form)
        .send()
        .await
        .map_err(|e| AuthError::Request(e.to_string()))?;

    let status = response.status();
    let body: TokenResponse = response
        .json()
        .await
        .map_err(|e| AuthError::Request(format!("invalid token response: {e}")))?;

    if !status.is_success() {
        let description = body
            .error_description
            .or(body.error)
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(AuthError::Rejected { status: status.as_u16(), description });
    }

    Ok(body)
}
