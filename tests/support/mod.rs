//! Shared helpers for integration tests
#![allow(dead_code)]

use apkforge::fs::FileStore;
use apkforge::pipeline::{PhaseOrchestrator, PipelineConfig, PipelineContext};
use apkforge::progress::{ProgressEvent, ProgressHandler};
use apkforge::server::{create_router, AppState};
use apkforge::store::{InMemoryProjectStore, ProjectId};
use apkforge::tools::OfflineToolProbe;
use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use bytes::Bytes;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "apkforge-test-boundary";

/// Upload limit used by [`TestApp`], small enough to exceed in tests.
pub const TEST_UPLOAD_LIMIT: u64 = 64 * 1024;

/// Builds an in-memory ZIP archive from `(path, content)` pairs.
pub fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buffer);
        for (name, content) in files {
            zip.start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buffer.into_inner()
}

/// A single-part `multipart/form-data` body.
pub fn multipart_body(field: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
        BOUNDARY, field, file_name, content_type
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Keeps every progress event for later inspection.
#[derive(Default)]
pub struct RecordingHandler {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingHandler {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Progress values written for one project, in order.
    pub fn progress_of(&self, id: ProjectId) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ProgressEvent::StatusChanged {
                    project_id,
                    progress,
                    ..
                } if project_id == id => Some(progress),
                _ => None,
            })
            .collect()
    }
}

impl ProgressHandler for RecordingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// Router plus its backing orchestrator over temporary storage, with tools
/// disabled.
pub struct TestApp {
    pub temp: TempDir,
    pub state: AppState,
    pub store: Arc<InMemoryProjectStore>,
    pub progress: Arc<RecordingHandler>,
}

impl TestApp {
    /// Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(InMemoryProjectStore::new());
        let progress = Arc::new(RecordingHandler::default());
        let context = PipelineContext::with_defaults(
            store.clone(),
            Arc::new(FileStore::new(
                temp.path().join("uploads"),
                temp.path().join("builds"),
            )),
            Arc::new(OfflineToolProbe),
        )
        .with_progress(progress.clone())
        .with_config(PipelineConfig::new().with_build_command(false));

        let state = AppState::new(PhaseOrchestrator::start(context), TEST_UPLOAD_LIMIT);
        Self {
            temp,
            state,
            store,
            progress,
        }
    }

    pub fn orchestrator(&self) -> &Arc<PhaseOrchestrator> {
        &self.state.orchestrator
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        let response = create_router(self.state.clone())
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        Response {
            status,
            headers,
            body,
        }
    }

    pub async fn request(&self, method: Method, uri: &str) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post_file(&self, uri: &str, file_name: &str, bytes: &[u8]) -> Response {
        let body = multipart_body("file", file_name, "application/zip", bytes);
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    pub async fn upload(&self, file_name: &str, bytes: &[u8]) -> Response {
        self.post_file("/api/projects/upload", file_name, bytes).await
    }

    /// Polls `GET /api/projects/:id` until `status` is reached.
    pub async fn wait_for_status(&self, id: ProjectId, status: &str) -> serde_json::Value {
        let uri = format!("/api/projects/{}", id);
        let mut last = serde_json::Value::Null;
        for _ in 0..250 {
            last = self.request(Method::GET, &uri).await.json();
            if last["status"] == status {
                return last;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("project {} never reached {}: {}", id, status, last);
    }
}
