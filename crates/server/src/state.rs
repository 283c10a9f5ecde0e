//! Shared services built once from `AppConfig`.

use std::sync::Arc;

use m365_client::auth::{ClientCredentialsProvider, DelegatedAuth, TokenProvider, Unconfigured};
use m365_client::{Crawler, DownloadCache, GraphClient, GraphConfig};
use m365_core::{AppConfig, CacheDb, CacheLayout, Region};

use crate::http::session::SessionStore;

/// Everything an operation needs, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub region: Region,
    pub graph: GraphClient,
    pub crawler: Crawler,
    pub downloads: DownloadCache,
    pub db: CacheDb,
    pub delegated: Option<DelegatedAuth>,
    pub sessions: SessionStore,
}

impl AppState {
    /// Build services from configuration, opening the SQLite cache at `db_path`.
    ///
    /// Missing app-only credentials are not fatal here: Graph calls then fail
    /// with an authentication error naming the missing setting.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let graph_config = GraphConfig::from_app(&config);
        let http = graph_config.http_client()?;

        let tokens: Arc<dyn TokenProvider> = match config.require_credentials() {
            Ok(credentials) => Arc::new(ClientCredentialsProvider::new(
                http.clone(),
                &config.authority_base_url,
                credentials,
            )),
            Err(e) => {
                tracing::warn!(error = %e, "app-only credentials missing; Graph calls will fail");
                Arc::new(Unconfigured(e.to_string()))
            }
        };

        let delegated = match config.require_delegated() {
            Ok(app) => Some(DelegatedAuth::new(http.clone(), &config.authority_base_url, app)),
            Err(e) => {
                tracing::debug!(error = %e, "delegated sign-in disabled");
                None
            }
        };

        let db = CacheDb::open(&config.db_path).await?;
        let graph = GraphClient::with_http(http, graph_config, tokens);
        Ok(Self::new(config, graph, db, delegated))
    }

    /// Assemble state around an existing Graph client and cache database.
    pub fn new(config: AppConfig, graph: GraphClient, db: CacheDb, delegated: Option<DelegatedAuth>) -> Self {
        let region = config.region();
        let crawler = Crawler::new(graph.clone());
        let downloads = DownloadCache::new(graph.clone(), CacheLayout::new(config.cache_dir.clone()), config.cache_ttl())
            .with_max_bytes(config.max_download_bytes);
        Self {
            config: Arc::new(config),
            region,
            graph,
            crawler,
            downloads,
            db,
            delegated,
            sessions: SessionStore::default(),
        }
    }
}
