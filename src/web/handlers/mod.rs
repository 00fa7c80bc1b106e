//! API handlers for the HTTP API.

pub mod file;

pub use file::*;

use std::sync::Arc;

use crate::file::{FileService, SharedBlobStore};
use crate::Database;

/// Thread-safe database handle for the HTTP API.
pub type SharedDatabase = Arc<Database>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Metadata store.
    pub db: SharedDatabase,
    /// Blob store.
    pub blob_store: SharedBlobStore,
    /// Origin used to build absolute download URLs.
    pub public_base_url: Option<String>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(db: SharedDatabase, blob_store: SharedBlobStore) -> Self {
        Self {
            db,
            blob_store,
            public_base_url: None,
        }
    }

    /// Set the public base URL for download links.
    pub fn with_public_base_url(mut self, base: Option<String>) -> Self {
        self.public_base_url = base;
        self
    }

    /// File service bound to this state's stores.
    pub fn file_service(&self) -> FileService<'_> {
        FileService::new(self.db.pool(), self.blob_store.as_ref())
            .with_public_base_url(self.public_base_url.as_deref())
    }
}
