//! Microsoft 365 search server: MCP tools over stdio and an HTTP API sharing
//! one set of operations.

pub mod error;
pub mod handler;
pub mod http;
pub mod state;
pub mod tools;

pub use handler::M365Server;
pub use state::AppState;
