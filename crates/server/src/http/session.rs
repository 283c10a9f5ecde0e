//! In-memory sign-in sessions keyed by an opaque cookie.

use std::collections::HashMap;
use std::sync::Arc;

use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde_json::Value;
use tokio::sync::RwLock;

pub const SESSION_COOKIE: &str = "m365_session";

/// State of one browser session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// `state` sent with the pending authorization request.
    pub pending_state: Option<String>,
    /// Profile of the signed-in user (`GET /me`).
    pub user: Option<Value>,
    /// Delegated access token of the signed-in user.
    pub access_token: Option<String>,
}

/// Server-side session table. Sessions live until the process exits.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    /// Start an empty session and return its id.
    pub async fn create(&self) -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.sessions.write().await.insert(id.clone(), Session::default());
        id
    }

    pub async fn get(&self, id: &str) -> Option<Session> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Apply `f` to an existing session. Returns false if the id is unknown.
    pub async fn update(&self, id: &str, f: impl FnOnce(&mut Session)) -> bool {
        match self.sessions.write().await.get_mut(id) {
            Some(session) => {
                f(session);
                true
            }
            None => false,
        }
    }

    /// The session named by the request cookie, if it exists.
    pub async fn lookup(&self, jar: &CookieJar) -> Option<(String, Session)> {
        let id = jar.get(SESSION_COOKIE)?.value().to_string();
        let session = self.get(&id).await?;
        Some((id, session))
    }
}

/// Session cookie for `id`, scoped to the whole site and hidden from scripts.
pub fn session_cookie(id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}
