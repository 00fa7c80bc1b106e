//! docshare - Minimal document-sharing service
//!
//! Files are uploaded over HTTP, their bytes kept in a blob store and their
//! metadata in a relational store, under a per-file size limit and a global
//! storage quota.

pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use config::Config;
pub use db::{Database, DbPool};
pub use error::{DocshareError, Result};
pub use file::{
    BlobStore, FileRecord, FileRepository, FileService, FsBlobStore, QuotaGuard, SharedBlobStore,
    MAX_FILE_SIZE, TOTAL_STORAGE_LIMIT,
};
pub use web::{AppState, WebServer};
