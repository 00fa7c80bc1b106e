//! Web API File Tests
//!
//! Integration tests for the list, upload, download and delete endpoints.

#![cfg(feature = "sqlite")]

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use docshare::file::{FileRepository, FsBlobStore, NewFileRecord};
use docshare::web::handlers::AppState;
use docshare::web::router::create_router;
use docshare::{Database, MAX_FILE_SIZE, TOTAL_STORAGE_LIMIT};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct TestApp {
    server: TestServer,
    db: Arc<Database>,
    blob_dir: TempDir,
}

/// Create a test server with an in-memory database and a temporary blob store.
async fn create_test_app(public_base_url: Option<&str>) -> TestApp {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let shared_db = Arc::new(db);

    let blob_dir = TempDir::new().expect("Failed to create blob dir");
    let blobs = FsBlobStore::new(blob_dir.path()).expect("Failed to create blob store");

    let app_state = Arc::new(
        AppState::new(shared_db.clone(), Arc::new(blobs))
            .with_public_base_url(public_base_url.map(str::to_string)),
    );

    let router = create_router(app_state, &[]);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        db: shared_db,
        blob_dir,
    }
}

fn file_form(filename: &str, mime: &str, content: impl Into<Vec<u8>>) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(content.into())
            .file_name(filename)
            .mime_type(mime),
    )
}

async fn upload(server: &TestServer, filename: &str, mime: &str, content: &[u8]) -> Value {
    let response = server
        .post("/api/upload")
        .multipart(file_form(filename, mime, content.to_vec()))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    response.json::<Value>()
}

/// Poll the listing until a file reaches the expected download count.
async fn wait_for_download_count(server: &TestServer, id: &str, expected: i64) {
    for _ in 0..100 {
        let listing = server.get("/api/files").await.json::<Value>();
        let count = listing["files"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["id"] == id)
            .and_then(|f| f["download_count"].as_i64());
        if count == Some(expected) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("download count for {id} never reached {expected}");
}

fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap()
}

// ============================================================================
// List
// ============================================================================

#[tokio::test]
async fn test_list_files_empty() {
    let app = create_test_app(None).await;

    let response = app.server.get("/api/files").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["files"].as_array().unwrap().len(), 0);
    assert_eq!(body["totalStorageUsed"], 0);
    assert_eq!(body["totalStorageLimit"], TOTAL_STORAGE_LIMIT);
}

#[tokio::test]
async fn test_list_files_newest_first() {
    let app = create_test_app(None).await;
    let repo = FileRepository::new(app.db.pool());

    for (id, created_at) in [("old", 1_000), ("new", 3_000), ("mid", 2_000)] {
        repo.create(
            &NewFileRecord::new(id, "x.bin", 4, "application/octet-stream", format!("{id}/x.bin"))
                .with_created_at(created_at),
        )
        .await
        .unwrap();
    }

    let body: Value = app.server.get("/api/files").await.json();
    let ids: Vec<&str> = body["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["new", "mid", "old"]);
    assert_eq!(body["totalStorageUsed"], 12);
}

// ============================================================================
// Upload / download / delete round trip
// ============================================================================

#[tokio::test]
async fn test_upload_download_delete() {
    let app = create_test_app(None).await;

    let uploaded = upload(&app.server, "a.txt", "text/plain", b"0123456789").await;
    let id = uploaded["id"].as_str().unwrap().to_string();
    assert_eq!(uploaded["filename"], "a.txt");
    assert_eq!(uploaded["size"], 10);
    assert_eq!(uploaded["downloadUrl"], format!("/api/files/{id}"));

    let listing: Value = app.server.get("/api/files").await.json();
    assert_eq!(listing["totalStorageUsed"], 10);
    let entry = &listing["files"][0];
    assert_eq!(entry["id"], id.as_str());
    assert_eq!(entry["filename"], "a.txt");
    assert_eq!(entry["size"], 10);
    assert_eq!(entry["content_type"], "text/plain");
    assert_eq!(entry["blob_key"], format!("{id}/a.txt"));
    assert_eq!(entry["download_count"], 0);
    assert!(entry["created_at"].as_i64().unwrap() > 0);

    let response = app.server.get(&format!("/api/files/{id}")).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(&response.as_bytes()[..], b"0123456789");
    let headers = response.headers();
    assert_eq!(headers.get("content-type").unwrap(), "text/plain");
    assert_eq!(
        headers.get("content-disposition").unwrap(),
        "attachment; filename=\"a.txt\""
    );
    assert_eq!(headers.get("content-length").unwrap(), "10");
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");

    wait_for_download_count(&app.server, &id, 1).await;

    let response = app.server.delete(&format!("/api/files/{id}")).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["success"], true);

    let listing: Value = app.server.get("/api/files").await.json();
    assert_eq!(listing["files"].as_array().unwrap().len(), 0);
    assert_eq!(listing["totalStorageUsed"], 0);

    let response = app.server.get(&format!("/api/files/{id}")).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    assert!(!app.blob_dir.path().join(&id).exists());
}

#[tokio::test]
async fn test_upload_absolute_download_url() {
    let app = create_test_app(Some("https://files.example.com")).await;

    let uploaded = upload(&app.server, "a.txt", "text/plain", b"hello").await;
    let id = uploaded["id"].as_str().unwrap();
    assert_eq!(
        uploaded["downloadUrl"],
        format!("https://files.example.com/api/files/{id}")
    );
}

#[tokio::test]
async fn test_upload_empty_file() {
    let app = create_test_app(None).await;

    let uploaded = upload(&app.server, "empty.txt", "text/plain", b"").await;
    assert_eq!(uploaded["size"], 0);

    let id = uploaded["id"].as_str().unwrap();
    let response = app.server.get(&format!("/api/files/{id}")).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.as_bytes().is_empty());
}

#[tokio::test]
async fn test_download_non_ascii_filename() {
    let app = create_test_app(None).await;

    let uploaded = upload(&app.server, "報告書.pdf", "application/pdf", b"%PDF").await;
    let id = uploaded["id"].as_str().unwrap();
    assert_eq!(uploaded["filename"], "報告書.pdf");

    let response = app.server.get(&format!("/api/files/{id}")).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"___.pdf\""));
    assert!(disposition.contains("filename*=UTF-8''%E5%A0%B1%E5%91%8A%E6%9B%B8.pdf"));
}

#[tokio::test]
async fn test_upload_path_like_filename_stays_in_store() {
    let app = create_test_app(None).await;

    let uploaded = upload(&app.server, "../../etc/passwd", "text/plain", b"root").await;
    let id = uploaded["id"].as_str().unwrap();

    let listing: Value = app.server.get("/api/files").await.json();
    let blob_key = listing["files"][0]["blob_key"].as_str().unwrap();
    let (prefix, name) = blob_key.split_once('/').unwrap();
    assert_eq!(prefix, id);
    assert!(!name.contains('/'));
    assert!(app.blob_dir.path().join(blob_key).exists());

    let response = app.server.get(&format!("/api/files/{id}")).await;
    assert_eq!(&response.as_bytes()[..], b"root");
}

// ============================================================================
// Error cases
// ============================================================================

#[tokio::test]
async fn test_download_unknown_id() {
    let app = create_test_app(None).await;

    let response = app.server.get("/api/files/does-not-exist").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let body: Value = response.json();
    assert_eq!(error_code(&body), "NOT_FOUND");
    assert_eq!(body["error"]["message"], "File not found");
}

#[tokio::test]
async fn test_delete_unknown_id() {
    let app = create_test_app(None).await;

    let response = app.server.delete("/api/files/does-not-exist").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response.json::<Value>()), "NOT_FOUND");
}

#[tokio::test]
async fn test_download_missing_blob() {
    let app = create_test_app(None).await;

    let uploaded = upload(&app.server, "a.txt", "text/plain", b"gone soon").await;
    let id = uploaded["id"].as_str().unwrap();

    std::fs::remove_file(app.blob_dir.path().join(id).join("a.txt")).unwrap();

    let response = app.server.get(&format!("/api/files/{id}")).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response.json::<Value>()), "NOT_FOUND");

    // The counter is only bumped for downloads that returned content
    tokio::time::sleep(Duration::from_millis(50)).await;
    let listing: Value = app.server.get("/api/files").await.json();
    assert_eq!(listing["files"][0]["download_count"], 0);
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let app = create_test_app(None).await;

    let response = app
        .server
        .post("/api/upload")
        .multipart(MultipartForm::new().add_text("comment", "no file here"))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(error_code(&body), "BAD_REQUEST");
    assert_eq!(body["error"]["message"], "No file provided");
}

#[tokio::test]
async fn test_upload_not_multipart() {
    let app = create_test_app(None).await;

    let response = app.server.post("/api/upload").text("plain body").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response.json::<Value>()), "BAD_REQUEST");
}

#[tokio::test]
async fn test_upload_file_too_large() {
    let app = create_test_app(None).await;

    let content = vec![0u8; MAX_FILE_SIZE as usize + 1];
    let response = app
        .server
        .post("/api/upload")
        .multipart(file_form("big.bin", "application/octet-stream", content))
        .await;
    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);

    let body: Value = response.json();
    assert_eq!(error_code(&body), "PAYLOAD_TOO_LARGE");
    assert_eq!(body["error"]["message"], "File too large (max 100MB)");

    let listing: Value = app.server.get("/api/files").await.json();
    assert_eq!(listing["files"].as_array().unwrap().len(), 0);
    assert_eq!(std::fs::read_dir(app.blob_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_upload_quota_exceeded() {
    let app = create_test_app(None).await;

    FileRepository::new(app.db.pool())
        .create(&NewFileRecord::new(
            "filler",
            "filler.bin",
            (TOTAL_STORAGE_LIMIT - 1) as i64,
            "application/octet-stream",
            "filler/filler.bin",
        ))
        .await
        .unwrap();

    let response = app
        .server
        .post("/api/upload")
        .multipart(file_form("two.bin", "application/octet-stream", b"ab".to_vec()))
        .await;
    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);

    let body: Value = response.json();
    assert_eq!(error_code(&body), "PAYLOAD_TOO_LARGE");
    assert_eq!(body["error"]["message"], "Storage quota exceeded");

    // Exactly filling the quota is allowed
    let uploaded = upload(&app.server, "one.bin", "application/octet-stream", b"a").await;
    assert_eq!(uploaded["size"], 1);

    let listing: Value = app.server.get("/api/files").await.json();
    assert_eq!(listing["totalStorageUsed"], TOTAL_STORAGE_LIMIT);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test]
async fn test_concurrent_uploads() {
    let app = create_test_app(None).await;

    let uploads = (0..8).map(|i| {
        let server = &app.server;
        async move {
            let name = format!("file-{i}.txt");
            let content = vec![b'x'; i + 1];
            upload(server, &name, "text/plain", &content).await
        }
    });
    let results = futures::future::join_all(uploads).await;

    let mut ids: Vec<&str> = results.iter().map(|r| r["id"].as_str().unwrap()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 8);

    let listing: Value = app.server.get("/api/files").await.json();
    assert_eq!(listing["files"].as_array().unwrap().len(), 8);
    assert_eq!(listing["totalStorageUsed"], (1..=8).sum::<u64>());
}
