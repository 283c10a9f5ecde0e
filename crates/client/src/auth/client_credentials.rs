//! App-only tokens via the client-credentials grant.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use m365_core::config::ClientCredentials;
use tokio::sync::Mutex;

use super::{AuthError, GRAPH_DEFAULT_SCOPE, TokenProvider, request_token, token_url};

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime assumed when the endpoint omits `expires_in`.
const DEFAULT_LIFETIME: Duration = Duration::from_secs(3600);

#[derive(Debug)]
struct CachedToken {
    token: String,
    refresh_at: Instant,
}

/// Acquires and caches app-only Graph tokens.
#[derive(Debug)]
pub struct ClientCredentialsProvider {
    http: reqwest::Client,
    token_url: String,
    credentials: ClientCredentials,
    cached: Mutex<Option<CachedToken>>,
}

impl ClientCredentialsProvider {
    pub fn new(http: reqwest::Client, authority: &str, credentials: ClientCredentials) -> Self {
        Self { http, token_url: token_url(authority, &credentials.tenant_id), credentials, cached: Mutex::new(None) }
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialsProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && Instant::now() < token.refresh_at
        {
            return Ok(token.token.clone());
        }

        tracing::info!("Acquiring token using client credentials");
        let response = request_token(
            &self.http,
            &self.token_url,
            &[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("scope", GRAPH_DEFAULT_SCOPE),
            ],
        )
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Failed to acquire token"))?;

        let token = response.access_token.ok_or(AuthError::MissingToken)?;
        let lifetime = response.expires_in.map(Duration::from_secs).unwrap_or(DEFAULT_LIFETIME);
        *cached = Some(CachedToken {
            token: token.clone(),
            refresh_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        });

        tracing::info!("Token acquired successfully");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> ClientCredentials {
        ClientCredentials { tenant_id: "contoso".into(), client_id: "app".into(), client_secret: "secret".into() }
    }

    #[tokio::test]
    async fn test_acquires_and_caches_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contoso/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access_token": "tok-1", "expires_in": 3599})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = ClientCredentialsProvider::new(reqwest::Client::new(), &server.uri(), credentials());
        assert_eq!(provider.access_token().await.unwrap(), "tok-1");
        assert_eq!(provider.access_token().await.unwrap(), "tok-1");
    }

    #[tokio::test]
    async fn test_short_lived_token_is_refreshed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contoso/oauth2/v2.0/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"access_token": "tok", "expires_in": 30})),
            )
            .expect(2)
            .mount(&server)
            .await;

        let provider = ClientCredentialsProvider::new(reqwest::Client::new(), &server.uri(), credentials());
        provider.access_token().await.unwrap();
        provider.access_token().await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "invalid_client",
                "error_description": "AADSTS7000215: Invalid client secret provided."
            })))
            .mount(&server)
            .await;

        let provider = ClientCredentialsProvider::new(reqwest::Client::new(), &server.uri(), credentials());
        let err = provider.access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected { status: 401, ref description } if description.contains("AADSTS7000215")));
    }

    #[tokio::test]
    async fn test_missing_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"token_type": "Bearer"})))
            .mount(&server)
            .await;

        let provider = ClientCredentialsProvider::new(reqwest::Client::new(), &server.uri(), credentials());
        assert!(matches!(provider.access_token().await, Err(AuthError::MissingToken)));
    }
}
