//! OpenAPI document for the HTTP API.

use utoipa::OpenApi;

use super::dto::{DeleteResponse, FileEntry, FileListResponse, UploadForm, UploadResponse};
use super::error::{ErrorBody, ErrorCode, ErrorDetail};
use super::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "docshare",
        description = "Upload, list, download and delete shared files."
    ),
    paths(
        handlers::file::list_files,
        handlers::file::upload_file,
        handlers::file::download_file,
        handlers::file::delete_file,
    ),
    components(schemas(
        FileEntry,
        FileListResponse,
        UploadForm,
        UploadResponse,
        DeleteResponse,
        ErrorBody,
        ErrorDetail,
        ErrorCode,
    )),
    tags(
        (name = "files", description = "Shared files")
    )
)]
pub struct ApiDoc;
