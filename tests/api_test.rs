use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt; // for `oneshot`

use async_trait::async_trait;
use mediadock::api::models::{ActionResponse, DownloadAcceptedResponse, DownloadView};
use mediadock::api::state::AppState;
use mediadock::config::Config;
use mediadock::engine::{
    FetchEngine, FetchOptions, MediaMetadata, ProgressEvent, ProgressSink,
    Result as EngineResult,
};
use mediadock::manager::{DownloadManager, ManagerSettings};
use mediadock::observability::Metrics;
use mediadock::store::{DownloadStatus, DownloadStore};

/// Engine that finishes instantly with fixed metadata; keeps the tests off
/// the network and the yt-dlp binary.
struct InstantEngine;

#[async_trait]
impl FetchEngine for InstantEngine {
    async fn resolve_metadata(
        &self,
        _url: &str,
        _options: &FetchOptions,
    ) -> EngineResult<MediaMetadata> {
        Ok(MediaMetadata {
            title: "Test Video".to_string(),
            duration: 60.0,
            formats: Vec::new(),
        })
    }

    async fn download(
        &self,
        _url: &str,
        _options: &FetchOptions,
        sink: ProgressSink,
    ) -> EngineResult<()> {
        sink.deliver(ProgressEvent {
            downloaded_bytes: 1000,
            total_bytes: Some(1000),
            ..Default::default()
        })?;
        Ok(())
    }
}

/// Builds a test app with isolated dependencies
fn build_test_app() -> (Router, DownloadManager, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = DownloadStore::open(temp_dir.path().join("store"))
        .expect("Failed to open test store");

    let metrics = Arc::new(Metrics::new());
    let settings = ManagerSettings {
        workers: 2,
        output_dir: temp_dir.path().to_path_buf(),
        cookies_path: None,
    };
    let manager = DownloadManager::new(
        store,
        Arc::new(InstantEngine),
        Arc::clone(&metrics),
        settings,
    );

    let state = AppState::new(Config::default(), manager.clone(), metrics);
    (mediadock::api::router(state), manager, temp_dir)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .body(Body::empty())
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("DELETE")
        .body(Body::empty())
        .unwrap()
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_start_download_accepted() {
    let (app, _manager, _temp_dir) = build_test_app();

    let request = post_json(
        "/api/downloads",
        json!({"url": "https://example.com/watch?v=1", "format": "mp4", "quality": "best"}),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let accepted: DownloadAcceptedResponse = read_json(response).await;
    assert!(!accepted.id.is_empty());
}

#[tokio::test]
async fn test_start_download_rejects_bad_url() {
    let (app, _manager, _temp_dir) = build_test_app();

    let response = app
        .clone()
        .oneshot(post_json("/api/downloads", json!({"url": ""})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(post_json(
            "/api/downloads",
            json!({"url": "ftp://example.com/file"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_and_list_downloads() {
    let (app, _manager, _temp_dir) = build_test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/downloads",
            json!({"url": "https://example.com/watch?v=1"}),
        ))
        .await
        .unwrap();
    let accepted: DownloadAcceptedResponse = read_json(response).await;

    let response = app
        .clone()
        .oneshot(get(&format!("/api/downloads/{}", accepted.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let view: DownloadView = read_json(response).await;
    assert_eq!(view.id, accepted.id);
    assert_eq!(view.url, "https://example.com/watch?v=1");

    let response = app.oneshot(get("/api/downloads")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let views: Vec<DownloadView> = read_json(response).await;
    assert_eq!(views.len(), 1);
}

#[tokio::test]
async fn test_get_unknown_download() {
    let (app, _manager, _temp_dir) = build_test_app();
    let response = app.oneshot(get("/api/downloads/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pause_unknown_download() {
    let (app, _manager, _temp_dir) = build_test_app();
    let response = app
        .oneshot(post("/api/downloads/nope/pause"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_existing_download() {
    let (app, _manager, _temp_dir) = build_test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/downloads",
            json!({"url": "https://example.com/watch?v=1"}),
        ))
        .await
        .unwrap();
    let accepted: DownloadAcceptedResponse = read_json(response).await;

    let response = app
        .oneshot(post(&format!("/api/downloads/{}/cancel", accepted.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let action: ActionResponse = read_json(response).await;
    assert!(action.success);
}

#[tokio::test]
async fn test_resume_conflicts_when_not_paused() {
    let (app, manager, _temp_dir) = build_test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/downloads",
            json!({"url": "https://example.com/watch?v=1"}),
        ))
        .await
        .unwrap();
    let accepted: DownloadAcceptedResponse = read_json(response).await;

    // Wait until the instant engine finished the attempt.
    for _ in 0..1000 {
        let record = manager.get(&accepted.id).unwrap().unwrap();
        if record.status == DownloadStatus::Completed {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let response = app
        .clone()
        .oneshot(post(&format!("/api/downloads/{}/resume", accepted.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .oneshot(post("/api/downloads/nope/resume"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_download() {
    let (app, _manager, _temp_dir) = build_test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/downloads",
            json!({"url": "https://example.com/watch?v=1"}),
        ))
        .await
        .unwrap();
    let accepted: DownloadAcceptedResponse = read_json(response).await;

    let response = app
        .clone()
        .oneshot(delete(&format!("/api/downloads/{}", accepted.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get(&format!("/api/downloads/{}", accepted.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_all_downloads() {
    let (app, _manager, _temp_dir) = build_test_app();

    for n in 0..2 {
        app.clone()
            .oneshot(post_json(
                "/api/downloads",
                json!({"url": format!("https://example.com/watch?v={n}")}),
            ))
            .await
            .unwrap();
    }

    let response = app.clone().oneshot(delete("/api/downloads")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/api/downloads")).await.unwrap();
    let views: Vec<DownloadView> = read_json(response).await;
    assert!(views.is_empty());
}

#[tokio::test]
async fn test_formats_requires_url() {
    let (app, _manager, _temp_dir) = build_test_app();
    let response = app.oneshot(get("/api/formats?url=")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_formats_probe() {
    let (app, _manager, _temp_dir) = build_test_app();
    let response = app
        .oneshot(get("/api/formats?url=https://example.com/watch?v=1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let metadata: serde_json::Value = read_json(response).await;
    assert_eq!(metadata["title"], "Test Video");
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _manager, _temp_dir) = build_test_app();
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health: serde_json::Value = read_json(response).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["components"]["manager"], "healthy");
}
