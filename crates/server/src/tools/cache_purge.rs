//! cache_purge tool implementation.
//!
//! Removes expired search responses and stale download directories.

use m365_core::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Purge expired search responses (default: true).
    #[serde(default = "default_true")]
    pub search: bool,

    /// Purge download directories older than the cache TTL (default: true).
    #[serde(default = "default_true")]
    pub downloads: bool,
}

impl Default for CachePurgeParams {
    fn default() -> Self {
        Self { search: true, downloads: true }
    }
}

fn default_true() -> bool {
    true
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Search responses deleted.
    pub search_entries: u64,
    /// Item directories deleted from the download cache.
    pub download_dirs: u64,
}

pub async fn purge_impl(state: &AppState, params: CachePurgeParams) -> Result<CachePurgeOutput, Error> {
    if !params.search && !params.downloads {
        return Err(Error::InvalidInput("At least one of search or downloads must be true".to_string()));
    }

    let search_entries = if params.search { state.db.purge_expired_search().await? } else { 0 };
    let download_dirs = if params.downloads { state.downloads.purge_stale().await? } else { 0 };

    tracing::info!(search_entries, download_dirs, "cache purged");
    Ok(CachePurgeOutput { search_entries, download_dirs })
}
