//! Router configuration for the HTTP API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::file::MAX_FILE_SIZE;

use super::handlers::{delete_file, download_file, list_files, upload_file, AppState};
use super::middleware::{create_cors_layer, security_headers};
use super::openapi::ApiDoc;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Largest request body accepted by the upload route.
pub fn upload_body_limit() -> usize {
    MAX_FILE_SIZE as usize + MULTIPART_OVERHEAD
}

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let file_routes = Router::new()
        .route("/files", get(list_files))
        .route("/files/:id", get(download_file).delete(delete_file))
        .route(
            "/upload",
            post(upload_file).layer(DefaultBodyLimit::max(upload_body_limit())),
        );

    Router::new()
        .nest("/api", file_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(security_headers)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

/// Create the Swagger UI router serving the OpenAPI document.
pub fn create_swagger_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// Create a router serving the client UI from `static_path`.
///
/// Unknown paths fall back to `index.html`. Returns `None` when the
/// directory does not exist.
pub fn create_static_router(static_path: &str) -> Option<Router> {
    let path = Path::new(static_path);
    if !path.is_dir() {
        tracing::warn!("Static directory not found: {}", static_path);
        return None;
    }

    let index = path.join("index.html");
    let service = ServeDir::new(path).fallback(ServeFile::new(index));

    Some(Router::new().fallback_service(service))
}
