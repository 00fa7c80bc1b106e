//! Upload admission against the per-file and total storage limits.

use crate::db::DbPool;
use crate::{DocshareError, Result};

use super::metadata::FileRepository;
use super::{MAX_FILE_SIZE, TOTAL_STORAGE_LIMIT};

/// Decide whether an upload of `size` bytes fits, given current usage.
pub fn check_admission(size: u64, total_used: u64) -> Result<()> {
    if size > MAX_FILE_SIZE {
        return Err(DocshareError::FileTooLarge {
            size,
            limit: MAX_FILE_SIZE,
        });
    }

    if total_used.saturating_add(size) > TOTAL_STORAGE_LIMIT {
        return Err(DocshareError::QuotaExceeded {
            used: total_used,
            requested: size,
            limit: TOTAL_STORAGE_LIMIT,
        });
    }

    Ok(())
}

/// Admission control for uploads.
///
/// Usage is read from the metadata store on every call. The read and the
/// later insert are not atomic: two uploads admitted against the same usage
/// figure can together exceed [`TOTAL_STORAGE_LIMIT`].
pub struct QuotaGuard<'a> {
    files: FileRepository<'a>,
}

impl<'a> QuotaGuard<'a> {
    /// Create a new guard over the given pool.
    pub fn new(pool: &'a DbPool) -> Self {
        Self {
            files: FileRepository::new(pool),
        }
    }

    /// Admit or reject an upload of `size` bytes.
    ///
    /// Returns the usage figure the decision was based on.
    pub async fn admit(&self, size: u64) -> Result<u64> {
        // Oversized files are rejected without touching the store
        if size > MAX_FILE_SIZE {
            return Err(DocshareError::FileTooLarge {
                size,
                limit: MAX_FILE_SIZE,
            });
        }

        let total_used = self.files.total_size().await?;
        check_admission(size, total_used)?;

        Ok(total_used)
    }
}
