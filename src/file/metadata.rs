//! File record types and repository for the metadata store.

use crate::db::{DbPool, INSERTION_ORDER_COLUMN};
use crate::{DocshareError, Result};

const SELECT_COLUMNS: &str =
    "SELECT id, filename, size, content_type, blob_key, created_at, download_count FROM files";

/// Metadata for one stored document.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FileRecord {
    /// Unique file ID (UUID v4 string).
    pub id: String,
    /// Original filename (display only).
    pub filename: String,
    /// Size in bytes, equal to the length of the stored blob.
    pub size: i64,
    /// Declared media type.
    pub content_type: String,
    /// Key of the object in the blob store.
    pub blob_key: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: i64,
    /// Number of successful downloads.
    pub download_count: i64,
}

/// Data for inserting a new file record.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    /// Unique file ID.
    pub id: String,
    /// Original filename.
    pub filename: String,
    /// Size in bytes.
    pub size: i64,
    /// Declared media type.
    pub content_type: String,
    /// Key of the object in the blob store.
    pub blob_key: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: i64,
}

impl NewFileRecord {
    /// Create a new record stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        filename: impl Into<String>,
        size: i64,
        content_type: impl Into<String>,
        blob_key: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            filename: filename.into(),
            size,
            content_type: content_type.into(),
            blob_key: blob_key.into(),
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Override the creation timestamp.
    pub fn with_created_at(mut self, created_at: i64) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Repository for file record operations.
pub struct FileRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FileRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new file record. The download counter starts at 0.
    pub async fn create(&self, file: &NewFileRecord) -> Result<FileRecord> {
        sqlx::query(
            "INSERT INTO files (id, filename, size, content_type, blob_key, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&file.id)
        .bind(&file.filename)
        .bind(file.size)
        .bind(&file.content_type)
        .bind(&file.blob_key)
        .bind(file.created_at)
        .execute(self.pool)
        .await?;

        self.get_by_id(&file.id)
            .await?
            .ok_or_else(|| DocshareError::NotFound(format!("file {}", file.id)))
    }

    /// Get a file record by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<FileRecord>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = $1");
        let file = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(file)
    }

    /// List all file records, newest first.
    ///
    /// Records sharing a `created_at` come back in reverse insertion order.
    pub async fn list_newest_first(&self) -> Result<Vec<FileRecord>> {
        let sql = format!(
            "{SELECT_COLUMNS} ORDER BY created_at DESC, {INSERTION_ORDER_COLUMN} DESC"
        );
        let files = sqlx::query_as::<_, FileRecord>(&sql)
            .fetch_all(self.pool)
            .await?;

        Ok(files)
    }

    /// Sum of `size` over all records.
    pub async fn total_size(&self) -> Result<u64> {
        let total: i64 =
            sqlx::query_scalar("SELECT CAST(COALESCE(SUM(size), 0) AS BIGINT) FROM files")
                .fetch_one(self.pool)
                .await?;

        Ok(total.max(0) as u64)
    }

    /// Count all file records.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Increment the download counter by one.
    ///
    /// Returns `false` if no record has the given ID.
    pub async fn increment_download_count(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE files SET download_count = download_count + 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a file record by ID.
    ///
    /// Returns `false` if no record has the given ID.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
