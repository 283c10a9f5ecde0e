//! Unified error types for m365-search.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the m365-search server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty drive id).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// No access token could be acquired.
    #[error("AUTH_FAILED: {0}")]
    AuthFailed(String),

    /// Graph answered with a non-success status.
    #[error("GRAPH_ERROR: status {status}: {message}")]
    Graph { status: u16, message: String },

    /// Network or decode failure talking to Graph.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Item metadata lookup failed, so the file name is unknown.
    #[error("METADATA_FAILED: {0}")]
    Metadata(String),

    /// File content download failed.
    #[error("DOWNLOAD_FAILED: {0}")]
    DownloadFailed(String),

    /// File content exceeds the configured size limit.
    #[error("DOWNLOAD_TOO_LARGE: {0}")]
    DownloadTooLarge(String),

    /// Every extractor failed on a file.
    #[error("EXTRACT_FAILED: {0}")]
    ExtractFailed(String),

    /// Requested site or item does not exist.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Reading or writing the download cache failed.
    #[error("CACHE_IO: {0}")]
    CacheIo(#[from] std::io::Error),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl Error {
    /// Whether the error came from token acquisition.
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::AuthFailed(_))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::AuthFailed(msg) => (-32001, msg.clone()),
            Error::Graph { status, message } => (-32002, format!("Graph returned {status}: {message}")),
            Error::HttpError(msg) => (-32003, msg.clone()),
            Error::Metadata(msg) => (-32004, msg.clone()),
            Error::DownloadFailed(msg) => (-32005, msg.clone()),
            Error::DownloadTooLarge(msg) => (-32006, msg.clone()),
            Error::ExtractFailed(msg) => (-32007, msg.clone()),
            Error::NotFound(msg) => (-32008, msg.clone()),
            Error::CacheIo(e) => (-32009, e.to_string()),
            Error::Database(e) => (-32010, e.to_string()),
            Error::MigrationFailed(msg) => (-32010, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
