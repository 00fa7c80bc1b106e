//! Request DTOs for the HTTP API.

use utoipa::ToSchema;

/// Multipart body of `POST /api/upload`.
///
/// Only used to document the request in the OpenAPI schema; the handler
/// reads the fields straight from the multipart stream.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// File to upload. The part's file name and content type are recorded.
    #[schema(value_type = String, format = Binary)]
    file: String,
}
