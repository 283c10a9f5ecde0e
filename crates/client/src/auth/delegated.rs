//! Delegated (user sign-in) authorization-code flow.

use m365_core::config::DelegatedApp;
use url::Url;

use super::{AuthError, request_token};

/// Permissions requested from the signed-in user.
pub const DELEGATED_SCOPES: &[&str] = &["User.Read", "Files.Read.All"];

/// Token issued for a signed-in user.
#[derive(Debug, Clone)]
pub struct DelegatedToken {
    pub access_token: String,
    pub expires_in: Option<u64>,
}

/// Builds sign-in redirects and redeems authorization codes.
#[derive(Debug, Clone)]
pub struct DelegatedAuth {
    http: reqwest::Client,
    authority: String,
    app: DelegatedApp,
}

impl DelegatedAuth {
    pub fn new(http: reqwest::Client, authority: &str, app: DelegatedApp) -> Self {
        let authority = format!("{}/{}", authority.trim_end_matches('/'), app.credentials.tenant_id);
        Self { http, authority, app }
    }

    fn scope() -> String {
        DELEGATED_SCOPES.join(" ")
    }

    /// URL the browser is sent to for sign-in; `state` comes back on the callback.
    pub fn authorize_url(&self, state: &str) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!("{}/oauth2/v2.0/authorize", self.authority))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.app.credentials.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.app.redirect_uri)
            .append_pair("response_mode", "query")
            .append_pair("scope", &Self::scope())
            .append_pair("state", state);
        Ok(url)
    }

    /// Redeem an authorization code for a user token.
    pub async fn exchange_code(&self, code: &str) -> Result<DelegatedToken, AuthError> {
        let url = format!("{}/oauth2/v2.0/token", self.authority);
        let scope = Self::scope();
        let response = request_token(
            &self.http,
            &url,
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.app.redirect_uri.as_str()),
                ("client_id", self.app.credentials.client_id.as_str()),
                ("client_secret", self.app.credentials.client_secret.as_str()),
                ("scope", scope.as_str()),
            ],
        )
        .await?;

        let access_token = response.access_token.ok_or(AuthError::MissingToken)?;
        Ok(DelegatedToken { access_token, expires_in: response.expires_in })
    }
}
