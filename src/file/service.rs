//! File service for docshare.
//!
//! This module sequences the four file operations against the quota guard,
//! the blob store and the metadata store:
//! - List: all records newest first, plus current usage
//! - Upload: admit, write the blob, then insert the record
//! - Download: look up the record, read the blob, bump the counter
//! - Delete: look up the record, delete the blob, then the record
//!
//! Upload and delete perform two independent writes in a fixed order with
//! no transaction spanning both stores. A crash between them leaves a
//! record whose blob is missing, which downloads report as not found.

use axum::body::Bytes;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::{DocshareError, Result};

use super::metadata::{FileRecord, FileRepository, NewFileRecord};
use super::quota::QuotaGuard;
use super::storage::BlobStore;
use super::{blob_key, DEFAULT_CONTENT_TYPE, TOTAL_STORAGE_LIMIT};

/// Request data for a file upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Original filename supplied by the client.
    pub filename: String,
    /// Media type declared by the client.
    pub content_type: Option<String>,
    /// File content.
    pub content: Bytes,
}

impl UploadRequest {
    /// Create a new upload request.
    pub fn new(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            content: content.into(),
        }
    }

    /// Set the declared media type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// The inserted record.
    pub record: FileRecord,
    /// Address the client can fetch the file from.
    pub download_url: String,
}

/// Result of listing files.
#[derive(Debug, Clone)]
pub struct FileListing {
    /// All records, newest first.
    pub files: Vec<FileRecord>,
    /// Sum of all record sizes.
    pub total_storage_used: u64,
    /// Total-capacity limit.
    pub total_storage_limit: u64,
}

/// Result of a file download.
#[derive(Debug)]
pub struct DownloadResult {
    /// File record as read before the counter increment.
    pub record: FileRecord,
    /// File content.
    pub content: Bytes,
}

/// Pick the media type to record for an upload.
///
/// A non-empty declared type wins; otherwise it is guessed from the
/// filename extension.
fn resolve_content_type(declared: Option<&str>, filename: &str) -> String {
    match declared.map(str::trim) {
        Some(ct) if !ct.is_empty() => ct.to_string(),
        _ => mime_guess::from_path(filename)
            .first_raw()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string(),
    }
}

/// File service handling list, upload, download and delete.
pub struct FileService<'a> {
    pool: &'a DbPool,
    blobs: &'a dyn BlobStore,
    public_base_url: Option<&'a str>,
}

impl<'a> FileService<'a> {
    /// Create a new FileService.
    pub fn new(pool: &'a DbPool, blobs: &'a dyn BlobStore) -> Self {
        Self {
            pool,
            blobs,
            public_base_url: None,
        }
    }

    /// Build absolute download URLs from the given origin.
    pub fn with_public_base_url(mut self, base: Option<&'a str>) -> Self {
        self.public_base_url = base;
        self
    }

    /// Download address for a file ID.
    pub fn download_url(&self, id: &str) -> String {
        match self.public_base_url {
            Some(base) => format!("{}/api/files/{}", base.trim_end_matches('/'), id),
            None => format!("/api/files/{id}"),
        }
    }

    /// List all files, newest first, with current usage.
    pub async fn list(&self) -> Result<FileListing> {
        let repo = FileRepository::new(self.pool);

        let files = repo.list_newest_first().await?;
        let total_storage_used = repo.total_size().await?;

        Ok(FileListing {
            files,
            total_storage_used,
            total_storage_limit: TOTAL_STORAGE_LIMIT,
        })
    }

    /// Upload a file.
    ///
    /// # Validation
    /// - Filename must be non-empty
    /// - Size must pass the quota guard
    ///
    /// Nothing is written when validation or admission fails.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadedFile> {
        let UploadRequest {
            filename,
            content_type,
            content,
        } = request;

        if filename.trim().is_empty() {
            return Err(DocshareError::BadRequest("No file provided".to_string()));
        }

        let size = content.len() as u64;
        let total_used = QuotaGuard::new(self.pool).admit(size).await.map_err(|e| {
            info!(size, error = %e, "Upload rejected");
            e
        })?;
        debug!(size, total_used, "Upload admitted");

        let id = Uuid::new_v4().to_string();
        let key = blob_key(&id, &filename);
        let content_type = resolve_content_type(content_type.as_deref(), &filename);

        let written = self
            .blobs
            .put(&key, content, &content_type)
            .await
            .map_err(|e| {
                error!(file_id = %id, blob_key = %key, error = %e, "Failed to store blob");
                e
            })?;

        let new_file = NewFileRecord::new(&id, &filename, written as i64, &content_type, &key);
        let record = match FileRepository::new(self.pool).create(&new_file).await {
            Ok(record) => record,
            Err(e) => {
                error!(file_id = %id, error = %e, "Failed to insert file record");
                // Best effort; a leftover blob is not counted against the quota
                if let Err(cleanup) = self.blobs.delete(&key).await {
                    warn!(blob_key = %key, error = %cleanup, "Failed to remove orphaned blob");
                }
                return Err(e);
            }
        };

        info!(file_id = %record.id, size = record.size, blob_key = %record.blob_key, "File uploaded");

        let download_url = self.download_url(&record.id);
        Ok(UploadedFile {
            record,
            download_url,
        })
    }

    /// Download a file.
    ///
    /// The download counter is incremented in a background task. A failed
    /// increment is logged and dropped; it never fails the download.
    pub async fn download(&self, id: &str) -> Result<DownloadResult> {
        let record = FileRepository::new(self.pool)
            .get_by_id(id)
            .await?
            .ok_or_else(|| DocshareError::NotFound("File".to_string()))?;

        let blob = self.blobs.get(&record.blob_key).await?.ok_or_else(|| {
            warn!(file_id = %record.id, blob_key = %record.blob_key, "File record has no blob");
            DocshareError::NotFound("File content".to_string())
        })?;

        let pool = self.pool.clone();
        let file_id = record.id.clone();
        tokio::spawn(async move {
            match FileRepository::new(&pool)
                .increment_download_count(&file_id)
                .await
            {
                Ok(true) => debug!(file_id = %file_id, "Download counted"),
                Ok(false) => debug!(file_id = %file_id, "File removed before download was counted"),
                Err(e) => warn!(file_id = %file_id, error = %e, "Failed to count download"),
            }
        });

        info!(file_id = %record.id, size = record.size, "File downloaded");

        Ok(DownloadResult {
            record,
            content: blob.data,
        })
    }

    /// Delete a file: blob first, then the record.
    ///
    /// Returns the deleted record.
    pub async fn delete(&self, id: &str) -> Result<FileRecord> {
        let repo = FileRepository::new(self.pool);

        let record = repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| DocshareError::NotFound("File".to_string()))?;

        let existed = self.blobs.delete(&record.blob_key).await.map_err(|e| {
            error!(file_id = %record.id, blob_key = %record.blob_key, error = %e, "Failed to delete blob");
            e
        })?;
        if !existed {
            warn!(file_id = %record.id, blob_key = %record.blob_key, "Blob was already missing");
        }

        repo.delete(&record.id).await?;

        info!(file_id = %record.id, size = record.size, "File deleted");
        Ok(record)
    }
}
