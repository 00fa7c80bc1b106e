//! HTTP API for docshare.
//!
//! Exposes listing, upload, download and deletion of shared files as a
//! JSON/multipart REST API, plus health, OpenAPI and static UI routes.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
