//! Response DTOs for the HTTP API.

use serde::Serialize;
use utoipa::ToSchema;

use crate::file::{FileListing, FileRecord, UploadedFile};

/// One file in the listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileEntry {
    /// File ID.
    pub id: String,
    /// Original filename.
    pub filename: String,
    /// Size in bytes.
    pub size: i64,
    /// Stored media type.
    pub content_type: String,
    /// Key of the object in the blob store.
    pub blob_key: String,
    /// Upload time in milliseconds since the Unix epoch.
    pub created_at: i64,
    /// Number of successful downloads.
    pub download_count: i64,
}

impl From<FileRecord> for FileEntry {
    fn from(f: FileRecord) -> Self {
        Self {
            id: f.id,
            filename: f.filename,
            size: f.size,
            content_type: f.content_type,
            blob_key: f.blob_key,
            created_at: f.created_at,
            download_count: f.download_count,
        }
    }
}

/// Response of `GET /api/files`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileListResponse {
    /// Files, newest first.
    pub files: Vec<FileEntry>,
    /// Bytes used by all files.
    pub total_storage_used: u64,
    /// Total capacity in bytes.
    pub total_storage_limit: u64,
}

impl From<FileListing> for FileListResponse {
    fn from(listing: FileListing) -> Self {
        Self {
            files: listing.files.into_iter().map(FileEntry::from).collect(),
            total_storage_used: listing.total_storage_used,
            total_storage_limit: listing.total_storage_limit,
        }
    }
}

/// Response of `POST /api/upload`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// New file ID.
    pub id: String,
    /// Original filename.
    pub filename: String,
    /// Stored size in bytes.
    pub size: i64,
    /// Where to download the file.
    pub download_url: String,
}

impl From<UploadedFile> for UploadResponse {
    fn from(uploaded: UploadedFile) -> Self {
        Self {
            id: uploaded.record.id,
            filename: uploaded.record.filename,
            size: uploaded.record.size,
            download_url: uploaded.download_url,
        }
    }
}

/// Response of `DELETE /api/files/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    /// Always `true`.
    pub success: bool,
}

impl DeleteResponse {
    /// Successful deletion.
    pub fn ok() -> Self {
        Self { success: true }
    }
}
