//! Download-and-extract cache for drive items.
//!
//! `fetch` resolves the item name, reuses or refreshes the raw file under
//! `{cache_dir}/{drive_id}/{item_id}/`, then reuses or rebuilds the extracted
//! text sidecar. Raw files and sidecars expire after the same TTL.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use m365_core::cache::files::{PARTIAL_SUFFIX, file_age};
use m365_core::cache::{CacheLayout, sanitize_file_name};
use m365_core::{ContentRecord, Error, RowWindow};
use tokio::io::AsyncWriteExt;

use crate::extract::ExtractorChain;
use crate::graph::{GraphClient, GraphError};

/// Default cap on a single download.
pub const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Cached access to drive item contents.
#[derive(Debug, Clone)]
pub struct DownloadCache {
    graph: GraphClient,
    layout: CacheLayout,
    ttl: Duration,
    max_bytes: u64,
    chain: Arc<ExtractorChain>,
}

impl DownloadCache {
    pub fn new(graph: GraphClient, layout: CacheLayout, ttl: Duration) -> Self {
        Self {
            graph,
            layout,
            ttl,
            max_bytes: DEFAULT_MAX_DOWNLOAD_BYTES,
            chain: Arc::new(ExtractorChain::default()),
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_chain(mut self, chain: ExtractorChain) -> Self {
        self.chain = Arc::new(chain);
        self
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    /// Extracted text of a drive item.
    ///
    /// Returns the `[No readable text found]` sentinel when no extractor
    /// produced text; the sentinel is never cached.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidInput` for ids that cannot name a cache directory
    /// - `Error::AuthFailed` when no token could be acquired
    /// - `Error::Metadata` when the item metadata call fails
    /// - `Error::DownloadFailed` / `Error::DownloadTooLarge` for content failures
    /// - `Error::CacheIo` for local file system failures
    pub async fn fetch(&self, drive_id: &str, item_id: &str, window: RowWindow) -> Result<Vec<ContentRecord>, Error> {
        let item_dir = self.layout.item_dir(drive_id, item_id)?;

        let item = self.graph.item(drive_id, item_id).await.map_err(|e| match e {
            GraphError::Auth(auth) => auth.into(),
            other => Error::Metadata(other.to_string()),
        })?;
        let fallback = format!("{item_id}.bin");
        let file_name = sanitize_file_name(item.name.as_deref().unwrap_or_default(), &fallback);

        let raw = match self.cached_raw_file(&item_dir).await? {
            Some(raw) => raw,
            None => {
                tokio::fs::create_dir_all(&item_dir).await?;
                let target = item_dir.join(&file_name);
                self.layout.evict(&target).await?;
                let bytes = self.download(drive_id, item_id, &target).await?;
                tracing::info!(path = %target.display(), bytes, "file downloaded");
                target
            }
        };

        if let Some(records) = self.layout.read_sidecar(&raw, self.ttl, window).await {
            tracing::debug!(path = %raw.display(), "using cached text");
            return Ok(records);
        }

        let chain = Arc::clone(&self.chain);
        let path = raw.clone();
        let extracted = tokio::task::spawn_blocking(move || chain.extract(&path, window))
            .await
            .map_err(|e| Error::ExtractFailed(format!("extraction task failed: {e}")))?;

        match extracted {
            Some(records) => {
                if let Err(e) = self.layout.write_sidecar(&raw, window, &records).await {
                    tracing::warn!(path = %raw.display(), error = %e, "failed to write text cache");
                }
                Ok(records)
            }
            None => {
                tracing::info!(path = %raw.display(), "no readable text");
                Ok(vec![ContentRecord::no_readable_text()])
            }
        }
    }

    /// Remove stale item directories from the download cache.
    pub async fn purge_stale(&self) -> Result<u64, Error> {
        self.layout.purge_stale(self.ttl).await
    }

    /// The item's raw file if present and younger than the TTL.
    ///
    /// A stale file is deleted together with its sidecar.
    async fn cached_raw_file(&self, item_dir: &Path) -> Result<Option<PathBuf>, Error> {
        let Some(raw) = self.layout.find_raw_file(item_dir).await? else {
            return Ok(None);
        };
        let age = file_age(&raw).await?;
        if age < self.ttl {
            tracing::debug!(path = %raw.display(), ?age, "using cached file");
            return Ok(Some(raw));
        }
        tracing::info!(path = %raw.display(), ?age, "deleting stale file");
        self.layout.evict(&raw).await?;
        Ok(None)
    }

    /// Stream the item content to `target` through a partial file.
    async fn download(&self, drive_id: &str, item_id: &str, target: &Path) -> Result<u64, Error> {
        let mut response = self.graph.content(drive_id, item_id).await.map_err(|e| match e {
            GraphError::Auth(auth) => auth.into(),
            other => {
                tracing::error!(drive_id, item_id, error = %other, "download failed");
                Error::DownloadFailed(other.to_string())
            }
        })?;

        if let Some(length) = response.content_length()
            && length > self.max_bytes
        {
            return Err(too_large(length, self.max_bytes));
        }

        let mut partial = target.as_os_str().to_owned();
        partial.push(PARTIAL_SUFFIX);
        let partial = PathBuf::from(partial);

        let result = self.write_body(&mut response, &partial).await;
        match result {
            Ok(written) => {
                tokio::fs::rename(&partial, target).await?;
                Ok(written)
            }
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                    tracing::debug!(path = %partial.display(), error = %cleanup, "partial file not removed");
                }
                Err(e)
            }
        }
    }

    async fn write_body(&self, response: &mut reqwest::Response, partial: &Path) -> Result<u64, Error> {
        let mut file = tokio::fs::File::create(partial).await?;
        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::DownloadFailed(GraphError::from(e).to_string()))?
        {
            written += chunk.len() as u64;
            if written > self.max_bytes {
                return Err(too_large(written, self.max_bytes));
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(written)
    }
}

fn too_large(size: u64, max: u64) -> Error {
    Error::DownloadTooLarge(format!("content is {size} bytes, limit is {max}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;
    use crate::graph::GraphConfig;
    use m365_core::cache::sidecar_path;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DAY: Duration = Duration::from_secs(86_400);

    fn cache(server: &MockServer, root: &Path, ttl: Duration) -> DownloadCache {
        let config = GraphConfig { base_url: server.uri(), ..Default::default() };
        let graph = GraphClient::new(config, Arc::new(StaticToken::new("t"))).unwrap();
        DownloadCache::new(graph, CacheLayout::new(root), ttl)
    }

    async fn mount_item(server: &MockServer, name: Option<&str>, body: &str, downloads: u64) {
        let meta = match name {
            Some(n) => json!({"id": "i1", "name": n, "file": {}}),
            None => json!({"id": "i1"}),
        };
        Mock::given(method("GET"))
            .and(path("/drives/d1/items/i1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(meta))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/drives/d1/items/i1/content"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(downloads)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_second_fetch_uses_cache() {
        let server = MockServer::start().await;
        mount_item(&server, Some("notes.txt"), "quarterly budget notes", 1).await;
        let tmp = tempfile::tempdir().unwrap();
        let cache = cache(&server, tmp.path(), DAY);

        let first = cache.fetch("d1", "i1", RowWindow::default()).await.unwrap();
        let second = cache.fetch("d1", "i1", RowWindow::default()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0].text, "quarterly budget notes");
        assert_eq!(first[0].source, "reader");
        let raw = tmp.path().join("d1/i1/notes.txt");
        assert!(raw.exists());
        assert!(sidecar_path(&raw).exists());
    }

    #[tokio::test]
    async fn test_expired_entry_is_downloaded_again() {
        let server = MockServer::start().await;
        mount_item(&server, Some("notes.txt"), "fresh text", 2).await;
        let tmp = tempfile::tempdir().unwrap();
        let cache = cache(&server, tmp.path(), Duration::ZERO);

        cache.fetch("d1", "i1", RowWindow::default()).await.unwrap();
        let again = cache.fetch("d1", "i1", RowWindow::default()).await.unwrap();
        assert_eq!(again[0].text, "fresh text");
    }

    #[tokio::test]
    async fn test_metadata_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drives/d1/items/i1"))
            .respond_with(ResponseTemplate::new(404).set_body_string("itemNotFound"))
            .mount(&server)
            .await;
        let tmp = tempfile::tempdir().unwrap();

        let err = cache(&server, tmp.path(), DAY)
            .fetch("d1", "i1", RowWindow::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Metadata(_)));
    }

    #[tokio::test]
    async fn test_unreadable_file_returns_sentinel_uncached() {
        let server = MockServer::start().await;
        mount_item(&server, None, "\u{1}\u{2}binary", 1).await;
        let tmp = tempfile::tempdir().unwrap();

        let records = cache(&server, tmp.path(), DAY)
            .fetch("d1", "i1", RowWindow::default())
            .await
            .unwrap();
        assert_eq!(records, vec![ContentRecord::no_readable_text()]);

        let raw = tmp.path().join("d1/i1/i1.bin");
        assert!(raw.exists());
        assert!(!sidecar_path(&raw).exists());
    }

    #[tokio::test]
    async fn test_download_over_limit() {
        let server = MockServer::start().await;
        mount_item(&server, Some("big.txt"), "0123456789", 1).await;
        let tmp = tempfile::tempdir().unwrap();

        let err = cache(&server, tmp.path(), DAY)
            .with_max_bytes(4)
            .fetch("d1", "i1", RowWindow::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DownloadTooLarge(_)));
        assert!(!tmp.path().join("d1/i1/big.txt").exists());
        assert!(!tmp.path().join("d1/i1/big.txt.part").exists());
    }

    #[tokio::test]
    async fn test_content_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drives/d1/items/i1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "i1", "name": "a.txt"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/drives/d1/items/i1/content"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let tmp = tempfile::tempdir().unwrap();

        let err = cache(&server, tmp.path(), DAY)
            .fetch("d1", "i1", RowWindow::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DownloadFailed(_)));
    }

    #[tokio::test]
    async fn test_purge_stale() {
        let server = MockServer::start().await;
        mount_item(&server, Some("notes.txt"), "text", 1).await;
        let tmp = tempfile::tempdir().unwrap();
        let cache = cache(&server, tmp.path(), DAY);
        cache.fetch("d1", "i1", RowWindow::default()).await.unwrap();

        assert_eq!(cache.purge_stale().await.unwrap(), 0);
        assert!(tmp.path().join("d1/i1/notes.txt").exists());
    }
}
