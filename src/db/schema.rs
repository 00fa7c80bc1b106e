//! Database schema and migrations for docshare.
//!
//! Migrations are applied in order the first time the database is opened
//! or after an upgrade. The `schema_version` table records which ones ran.

/// v1: file records. Only uses types shared by SQLite and PostgreSQL.
const FILES_V1: &str = r#"
CREATE TABLE files (
    id              TEXT PRIMARY KEY,
    filename        TEXT NOT NULL,
    size            BIGINT NOT NULL CHECK (size >= 0),
    content_type    TEXT NOT NULL,
    blob_key        TEXT NOT NULL UNIQUE,
    created_at      BIGINT NOT NULL,
    download_count  BIGINT NOT NULL DEFAULT 0 CHECK (download_count >= 0)
);

CREATE INDEX idx_files_created_at ON files(created_at);
"#;

/// v2 (PostgreSQL): insertion sequence used to order rows created in the
/// same millisecond. SQLite orders by its implicit `rowid` instead.
#[cfg(all(feature = "postgres", not(feature = "sqlite")))]
const FILES_SEQ_V2: &str = r#"
ALTER TABLE files ADD COLUMN seq BIGINT GENERATED ALWAYS AS IDENTITY;

DROP INDEX idx_files_created_at;
CREATE INDEX idx_files_created_at ON files(created_at, seq);
"#;

/// Database migrations for the enabled backend.
#[cfg(feature = "sqlite")]
pub const MIGRATIONS: &[&str] = &[FILES_V1];

/// Database migrations for the enabled backend.
#[cfg(all(feature = "postgres", not(feature = "sqlite")))]
pub const MIGRATIONS: &[&str] = &[FILES_V1, FILES_SEQ_V2];

/// Column breaking `created_at` ties in insertion order.
///
/// SQLite assigns each new row a `rowid` greater than every row currently
/// in the table, which the `created_at` index already carries.
#[cfg(feature = "sqlite")]
pub const INSERTION_ORDER_COLUMN: &str = "rowid";

/// Column breaking `created_at` ties in insertion order.
#[cfg(all(feature = "postgres", not(feature = "sqlite")))]
pub const INSERTION_ORDER_COLUMN: &str = "seq";
