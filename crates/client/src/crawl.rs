//! Drive tree crawler.
//!
//! Walks a drive's folder tree one children page at a time and flattens the
//! file items into a single list. Folders are traversed with an explicit
//! stack, so deep trees do not grow the async call stack.

use std::collections::HashSet;

use m365_core::{DriveItem, Error};

use crate::graph::{GraphClient, GraphError, RemoteItem};

/// Recursive drive listing over a [`GraphClient`].
#[derive(Debug, Clone)]
pub struct Crawler {
    graph: GraphClient,
}

struct Folder {
    id: Option<String>,
}

impl Crawler {
    pub fn new(graph: GraphClient) -> Self {
        Self { graph }
    }

    /// List every file under `parent_id` (or the drive root).
    ///
    /// Files whose name does not end in `.{extension}` are skipped when an
    /// extension is given. A page that fails to load ends the traversal of
    /// its folder only: items already collected and other folders are kept.
    /// Token failures abort the whole crawl.
    ///
    /// Within a folder, its files are listed before those of its subfolders;
    /// subfolders are visited in listing order.
    pub async fn crawl(
        &self, drive_id: &str, parent_id: Option<&str>, extension: Option<&str>,
    ) -> Result<Vec<DriveItem>, Error> {
        if drive_id.trim().is_empty() {
            return Err(Error::InvalidInput("drive id cannot be empty".into()));
        }
        let extension = extension.map(str::trim).filter(|e| !e.trim_start_matches('.').is_empty());

        tracing::info!(drive_id, ?parent_id, ?extension, "crawling drive");

        let mut files = Vec::new();
        let mut stack = vec![Folder { id: parent_id.map(str::to_string) }];
        let mut visited_folders = HashSet::new();
        let mut seen_pages = HashSet::new();
        let mut pages = 0usize;

        while let Some(folder) = stack.pop() {
            let folder_key = folder.id.clone().unwrap_or_else(|| "root".to_string());
            if !visited_folders.insert(folder_key.clone()) {
                tracing::debug!(folder = %folder_key, "folder already visited");
                continue;
            }

            let mut subfolders = Vec::new();
            let mut next = Some(self.graph.children_url(drive_id, folder.id.as_deref()));

            while let Some(url) = next.take() {
                if !seen_pages.insert(url.clone()) {
                    tracing::warn!(folder = %folder_key, %url, "repeated page link; stopping folder");
                    break;
                }

                let page = match self.graph.list_children(&url).await {
                    Ok(page) => page,
                    Err(GraphError::Auth(e)) => return Err(e.into()),
                    Err(e) => {
                        tracing::error!(folder = %folder_key, error = %e, "failed to list children; skipping rest of folder");
                        break;
                    }
                };
                pages += 1;

                for item in page.value {
                    if item.is_folder() {
                        subfolders.push(Folder { id: Some(item.id.clone()) });
                    } else if item.is_file() {
                        push_file(&mut files, item, drive_id, extension);
                    }
                }
                next = page.next_link;
            }

            stack.extend(subfolders.into_iter().rev());
        }

        tracing::info!(drive_id, files = files.len(), pages, "crawl finished");
        Ok(files)
    }
}

fn push_file(files: &mut Vec<DriveItem>, item: RemoteItem, drive_id: &str, extension: Option<&str>) {
    let mut file = DriveItem::from(item);
    if let Some(ext) = extension
        && !file.has_extension(ext)
    {
        return;
    }
    if file.drive_id.is_none() {
        file.drive_id = Some(drive_id.to_string());
    }
    files.push(file);
}
