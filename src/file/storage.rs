//! Blob storage for docshare.
//!
//! The service reaches its blob backend only through [`BlobStore`]. The
//! shipped backend, [`FsBlobStore`], maps each key onto a path below a root
//! directory:
//! ```text
//! {base_path}/
//! ├── 0f8e1c2a-.../
//! │   ├── report.pdf
//! │   └── report.pdf.meta.json
//! └── ...
//! ```
//! The `.meta.json` sidecar carries the stored content type.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::{DocshareError, Result};

const META_SUFFIX: &str = ".meta.json";

/// An object read back from the blob store.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    /// Object content.
    pub data: Bytes,
    /// Content type stored alongside the object, if any.
    pub content_type: Option<String>,
}

/// Key-addressed binary object store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `key` with the given content type.
    ///
    /// Fails if an object already exists under `key`. Returns the number of
    /// bytes written.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<u64>;

    /// Fetch an object. Returns `None` if nothing is stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<StoredBlob>>;

    /// Delete an object.
    ///
    /// Returns `Ok(false)` if the object did not exist.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Check whether an object exists.
    async fn exists(&self, key: &str) -> Result<bool>;
}

/// Shared handle to a blob store.
pub type SharedBlobStore = Arc<dyn BlobStore>;

#[derive(Debug, Serialize, Deserialize)]
struct BlobMeta {
    content_type: String,
    size: u64,
}

/// Filesystem-backed blob store.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    base_path: PathBuf,
}

impl FsBlobStore {
    /// Create a new store rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the root directory of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve a key to a path below the root.
    ///
    /// Keys are `/`-separated; empty, `.` and `..` segments, backslashes and
    /// NUL bytes are rejected so a key can never escape the root.
    pub fn object_path(&self, key: &str) -> Result<PathBuf> {
        let invalid = || DocshareError::StorageUnavailable(format!("invalid blob key: {key:?}"));

        if key.is_empty() || key.contains('\\') || key.contains('\0') {
            return Err(invalid());
        }

        let mut path = self.base_path.clone();
        for segment in key.split('/') {
            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(part)), None) => path.push(part),
                _ => return Err(invalid()),
            }
        }

        Ok(path)
    }

    fn meta_path(object_path: &Path) -> PathBuf {
        let mut name = object_path.as_os_str().to_owned();
        name.push(META_SUFFIX);
        PathBuf::from(name)
    }

    async fn read_meta(object_path: &Path) -> Option<BlobMeta> {
        let raw = fs::read(Self::meta_path(object_path)).await.ok()?;
        serde_json::from_slice(&raw).ok()
    }

    /// Write the object body and its sidecar.
    async fn write_object(
        mut file: fs::File,
        path: &Path,
        data: &[u8],
        content_type: &str,
    ) -> Result<u64> {
        file.write_all(data).await?;
        file.sync_all().await?;

        let written = data.len() as u64;
        let meta = BlobMeta {
            content_type: content_type.to_string(),
            size: written,
        };
        let meta = serde_json::to_vec(&meta)
            .map_err(|e| DocshareError::StorageUnavailable(e.to_string()))?;
        fs::write(Self::meta_path(path), meta).await?;

        Ok(written)
    }

    /// Best-effort removal of a partially written object and its sidecar.
    async fn remove_partial(&self, path: &Path) {
        for target in [path.to_path_buf(), Self::meta_path(path)] {
            match fs::remove_file(&target).await {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %target.display(), error = %e, "Failed to remove partial blob");
                }
            }
        }
        self.prune_empty_parents(path).await;
    }

    /// Remove now-empty directories between the object and the root.
    async fn prune_empty_parents(&self, object_path: &Path) {
        let mut dir = object_path.parent();
        while let Some(current) = dir {
            if current == self.base_path || !current.starts_with(&self.base_path) {
                break;
            }
            // remove_dir fails on non-empty directories, which ends the walk
            if fs::remove_dir(current).await.is_err() {
                break;
            }
            dir = current.parent();
        }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<u64> {
        let path = self.object_path(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(DocshareError::StorageUnavailable(format!(
                    "blob key already in use: {key}"
                )));
            }
            Err(e) => return Err(e.into()),
        };

        match Self::write_object(file, &path, &data, content_type).await {
            Ok(written) => Ok(written),
            Err(e) => {
                // The object was created by this call, so nobody else owns it
                self.remove_partial(&path).await;
                Err(e)
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Option<StoredBlob>> {
        let path = self.object_path(key)?;

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let content_type = Self::read_meta(&path).await.map(|m| m.content_type);

        Ok(Some(StoredBlob {
            data: Bytes::from(data),
            content_type,
        }))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let path = self.object_path(key)?;

        let deleted = match fs::remove_file(&path).await {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };

        match fs::remove_file(Self::meta_path(&path)).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        self.prune_empty_parents(&path).await;

        Ok(deleted)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.object_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }
}
