//! File management module for docshare.
//!
//! This module provides the document-sharing core:
//! - File record metadata and its repository
//! - Blob storage behind the `BlobStore` trait
//! - Quota admission for uploads
//! - The list/upload/download/delete service

mod metadata;
mod quota;
mod service;
mod storage;

pub use metadata::{FileRecord, FileRepository, NewFileRecord};
pub use quota::{check_admission, QuotaGuard};
pub use service::{DownloadResult, FileListing, FileService, UploadRequest, UploadedFile};
pub use storage::{BlobStore, FsBlobStore, SharedBlobStore, StoredBlob};

/// Maximum size of a single file (100 MiB).
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Total storage capacity across all files (5 GiB).
pub const TOTAL_STORAGE_LIMIT: u64 = 5 * 1024 * 1024 * 1024;

/// Media type recorded when the client declares none and none can be guessed.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Derive the blob key for a file: `{id}/{filename}`.
///
/// Path separators and control characters in the filename are replaced
/// with `_`, so the key always has exactly two non-traversing segments.
pub fn blob_key(id: &str, filename: &str) -> String {
    let name: String = filename
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let name = match name.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => name,
    };

    format!("{id}/{name}")
}
