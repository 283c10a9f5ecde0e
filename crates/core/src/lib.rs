//! Core types and shared functionality for m365-search.
//!
//! This crate provides:
//! - Drive and content record types shared by the client and server
//! - SQLite cache for Graph search responses
//! - On-disk layout of the download cache
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod model;

pub use cache::{CacheDb, CacheLayout};
pub use config::{AppConfig, Region};
pub use error::Error;
pub use model::{ContentRecord, DriveItem, FileHit, FileType, RowWindow};
