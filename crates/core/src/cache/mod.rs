//! Persistent caches.
//!
//! - `CacheDb`: SQLite (tokio-rusqlite, WAL mode) store for Graph search
//!   responses with per-entry expiry and schema migrations
//! - `CacheLayout`: the on-disk tree of downloaded files and their extracted
//!   text sidecars

pub mod connection;
pub mod files;
pub mod hash;
pub mod migrations;
pub mod search;

pub use crate::Error;

pub use connection::CacheDb;
pub use files::{CacheLayout, Sidecar, sanitize_file_name, sidecar_path};
