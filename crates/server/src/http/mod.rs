//! HTTP API (axum).
//!
//! - `GET /search`, `/get_file_content`, `/crawl`, `/search_site`: app-only
//!   operations, JSON in query strings, JSON out
//! - `GET /`, `/auth/login`, `/auth/callback`, `/me/files`: delegated sign-in
//! - `GET /health`

pub mod auth;
pub mod session;

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::routing::get;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::AppState;
use crate::tools::{
    self, CrawlOutput, CrawlParams, FileContentParams, SearchOutput, SearchParams, SearchSiteOutput, SearchSiteParams,
};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/search", get(search))
        .route("/get_file_content", get(file_content))
        .route("/crawl", get(crawl))
        .route("/search_site", get(search_site))
        .route("/", get(auth::home))
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/me/files", get(auth::my_files))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchOutput>, ApiError> {
    Ok(Json(tools::search_impl(&state, params).await?))
}

/// Text of the first extracted record.
async fn file_content(
    State(state): State<AppState>, Query(params): Query<FileContentParams>,
) -> Result<Json<Value>, ApiError> {
    let output = tools::file_content_impl(&state, params).await?;
    Ok(Json(json!({ "content": output.first_text() })))
}

async fn crawl(State(state): State<AppState>, Query(params): Query<CrawlParams>) -> Result<Json<CrawlOutput>, ApiError> {
    Ok(Json(tools::crawl_impl(&state, params).await?))
}

async fn search_site(
    State(state): State<AppState>, Query(params): Query<SearchSiteParams>,
) -> Result<Json<SearchSiteOutput>, ApiError> {
    Ok(Json(tools::search_site_impl(&state, params).await?))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
