//! Delegated sign-in routes.
//!
//! `/auth/login` starts the authorization-code flow, `/auth/callback`
//! redeems the code into a session-held user token, and `/me/files` lists
//! the signed-in user's OneDrive root with that token.

use axum::Json;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use m365_client::GraphError;
use serde::Deserialize;
use serde_json::{Value, json};

use super::session::session_cookie;
use crate::error::ApiError;
use crate::state::AppState;

/// Session status of the caller.
pub async fn home(State(state): State<AppState>, jar: CookieJar) -> Json<Value> {
    match state.sessions.lookup(&jar).await {
        Some((_, session)) if session.access_token.is_some() => {
            let user = session.user.unwrap_or_else(|| json!({}));
            let name = user.get("displayName").cloned().unwrap_or(Value::Null);
            Json(json!({ "signed_in": true, "name": name, "user": user, "files": "/me/files" }))
        }
        _ => Json(json!({ "signed_in": false, "login": "/auth/login" })),
    }
}

/// Redirect to the Microsoft sign-in page.
pub async fn login(State(state): State<AppState>, jar: CookieJar) -> Result<Response, ApiError> {
    let delegated = state
        .delegated
        .as_ref()
        .ok_or_else(|| ApiError::SignIn("delegated sign-in is not configured".into()))?;

    let id = match state.sessions.lookup(&jar).await {
        Some((id, _)) => id,
        None => state.sessions.create().await,
    };
    let flow_state = uuid::Uuid::new_v4().simple().to_string();
    state
        .sessions
        .update(&id, |s| s.pending_state = Some(flow_state.clone()))
        .await;

    let url = delegated
        .authorize_url(&flow_state)
        .map_err(|e| ApiError::SignIn(format!("invalid authority URL: {e}")))?;

    tracing::info!("redirecting to sign-in");
    Ok((jar.add(session_cookie(id)), Redirect::to(url.as_str())).into_response())
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Redeem the authorization code and store the user token in the session.
pub async fn callback(
    State(state): State<AppState>, jar: CookieJar, Query(query): Query<CallbackQuery>,
) -> Result<Response, ApiError> {
    let delegated = state
        .delegated
        .as_ref()
        .ok_or_else(|| ApiError::SignIn("delegated sign-in is not configured".into()))?;

    if let Some(error) = query.error {
        return Err(ApiError::SignIn(query.error_description.unwrap_or(error)));
    }

    let Some((id, session)) = state.sessions.lookup(&jar).await else {
        return Err(ApiError::SignIn("no sign-in in progress".into()));
    };
    if session.pending_state.is_none() || session.pending_state != query.state {
        return Err(ApiError::SignIn("sign-in state mismatch".into()));
    }
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::SignIn("missing authorization code".into()))?;

    let token = delegated.exchange_code(&code).await.map_err(|e| {
        tracing::error!(error = %e, "authorization code exchange failed");
        ApiError::SignIn(e.to_string())
    })?;

    let user = match state.graph.me(&token.access_token).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read signed-in user profile");
            json!({})
        }
    };

    state
        .sessions
        .update(&id, |s| {
            s.pending_state = None;
            s.access_token = Some(token.access_token);
            s.user = Some(user);
        })
        .await;

    tracing::info!("user signed in");
    Ok(Redirect::to("/").into_response())
}

/// Root children of the signed-in user's OneDrive, as Graph returns them.
pub async fn my_files(State(state): State<AppState>, jar: CookieJar) -> Result<Response, ApiError> {
    let token = state
        .sessions
        .lookup(&jar)
        .await
        .and_then(|(_, session)| session.access_token);
    let Some(token) = token else {
        return Ok(Redirect::to("/auth/login").into_response());
    };

    match state.graph.my_drive_children(&token).await {
        Ok(value) => Ok(Json(value).into_response()),
        Err(GraphError::Status { status, body }) => Err(ApiError::Upstream {
            status: axum::http::StatusCode::from_u16(status).unwrap_or(axum::http::StatusCode::BAD_GATEWAY),
            message: body,
        }),
        Err(e) => Err(ApiError::Op(e.into())),
    }
}
