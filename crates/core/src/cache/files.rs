//! On-disk layout of the download cache.
//!
//! ```text
//! {root}/{drive_id}/{item_id}/{file_name}             raw file
//! {root}/{drive_id}/{item_id}/{file_name}.cache.json  extracted text
//! ```
//!
//! Each item directory holds at most one raw file and one sidecar. Freshness
//! of the raw file comes from its modification time; the sidecar carries its
//! own fetch timestamp and the row window it was extracted with.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{ContentRecord, RowWindow};
use crate::Error;

/// Suffix appended to a raw file name to form its sidecar.
pub const SIDECAR_SUFFIX: &str = ".cache.json";

/// Suffix of an in-progress download.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Extracted text persisted next to a raw file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sidecar {
    pub fetched_at: DateTime<Utc>,
    pub window: RowWindow,
    pub records: Vec<ContentRecord>,
}

/// Paths and housekeeping for the download cache tree.
#[derive(Debug, Clone)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the cached copy of one drive item.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` when either id could escape the cache
    /// root (empty, `.`/`..`, or containing a path separator).
    pub fn item_dir(&self, drive_id: &str, item_id: &str) -> Result<PathBuf, Error> {
        check_component("drive id", drive_id)?;
        check_component("item id", item_id)?;
        Ok(self.root.join(drive_id).join(item_id))
    }

    /// The raw file inside an item directory, if any.
    ///
    /// Sidecars and partial downloads are skipped. A missing directory is
    /// treated as empty.
    pub async fn find_raw_file(&self, item_dir: &Path) -> Result<Option<PathBuf>, Error> {
        let mut entries = match tokio::fs::read_dir(item_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut candidates = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(SIDECAR_SUFFIX) || name.ends_with(PARTIAL_SUFFIX) {
                continue;
            }
            if entry.file_type().await?.is_file() {
                candidates.push(entry.path());
            }
        }
        candidates.sort();
        Ok(candidates.into_iter().next())
    }

    /// Remove a raw file and its sidecar. Missing files are ignored.
    pub async fn evict(&self, raw_file: &Path) -> Result<(), Error> {
        remove_if_exists(raw_file).await?;
        remove_if_exists(&sidecar_path(raw_file)).await
    }

    /// Read the sidecar for `raw_file` if it is younger than `ttl` and was
    /// extracted with `window`.
    ///
    /// Unreadable or malformed sidecars count as a miss.
    pub async fn read_sidecar(&self, raw_file: &Path, ttl: Duration, window: RowWindow) -> Option<Vec<ContentRecord>> {
        let path = sidecar_path(raw_file);
        let bytes = tokio::fs::read(&path).await.ok()?;
        let sidecar: Sidecar = match serde_json::from_slice(&bytes) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed text cache");
                return None;
            }
        };

        let age = Utc::now().signed_duration_since(sidecar.fetched_at).to_std().unwrap_or_default();
        if age >= ttl || sidecar.window != window {
            return None;
        }
        Some(sidecar.records)
    }

    /// Persist extracted records next to `raw_file`.
    pub async fn write_sidecar(&self, raw_file: &Path, window: RowWindow, records: &[ContentRecord]) -> Result<(), Error> {
        let sidecar = Sidecar { fetched_at: Utc::now(), window, records: records.to_vec() };
        let json = serde_json::to_vec_pretty(&sidecar)
            .map_err(|e| Error::ExtractFailed(format!("failed to serialize text cache: {e}")))?;
        tokio::fs::write(sidecar_path(raw_file), json).await?;
        Ok(())
    }

    /// Delete item directories whose raw file is missing or older than `ttl`.
    ///
    /// Returns the number of item directories removed.
    pub async fn purge_stale(&self, ttl: Duration) -> Result<u64, Error> {
        let mut removed = 0;
        for drive_dir in list_dirs(&self.root).await? {
            for item_dir in list_dirs(&drive_dir).await? {
                let stale = match self.find_raw_file(&item_dir).await? {
                    Some(raw) => file_age(&raw).await? >= ttl,
                    None => true,
                };
                if stale {
                    tokio::fs::remove_dir_all(&item_dir).await?;
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}

/// Sidecar path for a raw file: `{file}.cache.json`.
pub fn sidecar_path(raw_file: &Path) -> PathBuf {
    let mut name = raw_file.as_os_str().to_owned();
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

/// Time since the file was last modified.
pub async fn file_age(path: &Path) -> Result<Duration, Error> {
    let modified = tokio::fs::metadata(path).await?.modified()?;
    Ok(SystemTime::now().duration_since(modified).unwrap_or_default())
}

/// Make a remote file name safe to use as a single path component.
pub fn sanitize_file_name(name: &str, fallback: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty()
        || cleaned == "."
        || cleaned == ".."
        || cleaned.ends_with(SIDECAR_SUFFIX)
        || cleaned.ends_with(PARTIAL_SUFFIX)
    {
        fallback.to_string()
    } else {
        cleaned.to_string()
    }
}

fn check_component(what: &str, value: &str) -> Result<(), Error> {
    if value.is_empty() || value == "." || value == ".." || value.contains(['/', '\\', '\0']) {
        return Err(Error::InvalidInput(format!("invalid {what}: {value:?}")));
    }
    Ok(())
}

async fn remove_if_exists(path: &Path) -> Result<(), Error> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn list_dirs(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(86_400);

    async fn layout_with_file(name: &str) -> (tempfile::TempDir, CacheLayout, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let layout = CacheLayout::new(tmp.path());
        let dir = layout.item_dir("drive1", "item1").unwrap();
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let file = dir.join(name);
        tokio::fs::write(&file, b"hello").await.unwrap();
        (tmp, layout, file)
    }

    #[test]
    fn test_item_dir_rejects_traversal() {
        let layout = CacheLayout::new("/cache");
        assert!(layout.item_dir("..", "x").is_err());
        assert!(layout.item_dir("d", "a/b").is_err());
        assert!(layout.item_dir("", "x").is_err());
        assert_eq!(layout.item_dir("b!abc", "01XYZ").unwrap(), PathBuf::from("/cache/b!abc/01XYZ"));
    }

    #[test]
    fn test_sidecar_path() {
        assert_eq!(sidecar_path(Path::new("/c/d/i/Budget.xlsx")), PathBuf::from("/c/d/i/Budget.xlsx.cache.json"));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Q1/Q2 report.docx", "x.bin"), "Q1_Q2 report.docx");
        assert_eq!(sanitize_file_name("..", "item.bin"), "item.bin");
        assert_eq!(sanitize_file_name("  ", "item.bin"), "item.bin");
        assert_eq!(sanitize_file_name("evil.cache.json", "item.bin"), "item.bin");
    }

    #[tokio::test]
    async fn test_find_raw_file_skips_sidecar() {
        let (_tmp, layout, file) = layout_with_file("notes.txt").await;
        let dir = file.parent().unwrap().to_path_buf();
        layout
            .write_sidecar(&file, RowWindow::default(), &[ContentRecord::manual("hello")])
            .await
            .unwrap();

        let found = layout.find_raw_file(&dir).await.unwrap();
        assert_eq!(found, Some(file));
    }

    #[tokio::test]
    async fn test_find_raw_file_missing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = CacheLayout::new(tmp.path());
        let found = layout.find_raw_file(&tmp.path().join("nope")).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_sidecar_roundtrip_respects_window_and_ttl() {
        let (_tmp, layout, file) = layout_with_file("sheet.xlsx").await;
        let records = vec![ContentRecord::manual("a | b")];
        let window = RowWindow::new(0, 50);
        layout.write_sidecar(&file, window, &records).await.unwrap();

        assert_eq!(layout.read_sidecar(&file, DAY, window).await, Some(records));
        assert!(layout.read_sidecar(&file, DAY, RowWindow::new(50, 50)).await.is_none());
        assert!(layout.read_sidecar(&file, Duration::ZERO, window).await.is_none());
    }

    #[tokio::test]
    async fn test_evict_removes_file_and_sidecar() {
        let (_tmp, layout, file) = layout_with_file("notes.txt").await;
        layout
            .write_sidecar(&file, RowWindow::default(), &[ContentRecord::manual("x")])
            .await
            .unwrap();

        layout.evict(&file).await.unwrap();
        assert!(!file.exists());
        assert!(!sidecar_path(&file).exists());
        layout.evict(&file).await.unwrap();
    }

    #[tokio::test]
    async fn test_purge_stale() {
        let (tmp, layout, _file) = layout_with_file("notes.txt").await;
        let empty = layout.item_dir("drive1", "empty").unwrap();
        tokio::fs::create_dir_all(&empty).await.unwrap();

        assert_eq!(layout.purge_stale(DAY).await.unwrap(), 1);
        assert!(!empty.exists());

        assert_eq!(layout.purge_stale(Duration::ZERO).await.unwrap(), 1);
        assert!(!tmp.path().join("drive1").join("item1").exists());
    }
}
