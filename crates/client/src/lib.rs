//! Microsoft Graph client code for m365-search.
//!
//! This crate provides token acquisition, the Graph REST client, the drive
//! crawler, office document text extraction, and the download cache shared
//! by the MCP and HTTP servers.

pub mod auth;
pub mod crawl;
pub mod download;
pub mod extract;
pub mod graph;

pub use auth::{AuthError, ClientCredentialsProvider, DelegatedAuth, DelegatedToken, StaticToken, TokenProvider, Unconfigured};
pub use crawl::Crawler;
pub use download::DownloadCache;
pub use extract::{Extractor, ExtractorChain};
pub use graph::{GraphClient, GraphConfig, GraphError, SearchRequest, SearchResponse};
