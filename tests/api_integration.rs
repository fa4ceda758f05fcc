//! HTTP API tests driven through the router with `oneshot`

mod support;

use apkforge::store::{NewProject, ProjectStatus, ProjectStore, ProjectUpdate};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use support::{zip_bytes, TestApp, TEST_UPLOAD_LIMIT};

fn cordova_zip() -> Vec<u8> {
    zip_bytes(&[
        (
            "config.xml",
            r#"<widget id="com.example.notes" version="2.1.0"><name>Notes</name></widget>"#,
        ),
        ("www/index.html", "<html><body>Notes</body></html>"),
        ("www/js/app.js", "console.log('notes');"),
    ])
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let response = app.request(Method::GET, "/health").await;

    assert_eq!(response.status, StatusCode::OK);
    let json = response.json();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], apkforge::VERSION);
}

#[tokio::test]
async fn test_validate_reports_without_creating_projects() {
    let app = TestApp::new();

    let valid = app
        .post_file("/api/projects/validate", "app.zip", &cordova_zip())
        .await;
    assert_eq!(valid.status, StatusCode::OK);
    let json = valid.json();
    assert_eq!(json["isValid"], true);
    assert_eq!(json["zipValid"], true);
    assert_eq!(json["fileInfo"]["name"], "app.zip");

    let invalid = app
        .post_file("/api/projects/validate", "app.rar", b"Rar!\x1a\x07")
        .await;
    assert_eq!(invalid.status, StatusCode::OK);
    let json = invalid.json();
    assert_eq!(json["isValid"], false);
    assert_eq!(
        json["errors"],
        serde_json::json!(["Only ZIP files are supported", "File is not a valid ZIP archive"])
    );

    assert!(app.store.list_projects().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_validate_oversized_file() {
    let app = TestApp::new();
    let mut bytes = b"PK\x03\x04".to_vec();
    bytes.resize(TEST_UPLOAD_LIMIT as usize + 1024, 0);

    let response = app.post_file("/api/projects/validate", "big.zip", &bytes).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json()["errors"][0],
        "File size (65 KB) exceeds maximum limit (64 KB)"
    );
}

#[tokio::test]
async fn test_validate_without_file() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/projects/validate")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", support::BOUNDARY),
        )
        .body(Body::from(format!("--{}--\r\n", support::BOUNDARY)))
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let json = response.json();
    assert_eq!(json["errors"][0], "No file uploaded");
    assert!(json["fileInfo"].is_null());
}

#[tokio::test]
async fn test_upload_missing_file_field() {
    let app = TestApp::new();
    let body = support::multipart_body("attachment", "app.zip", "application/zip", b"PK");
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/projects/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", support::BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["code"], "NO_FILE");
}

#[tokio::test]
async fn test_upload_rejects_invalid_file() {
    let app = TestApp::new();

    let response = app.upload("notes.txt", b"just text").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let json = response.json();
    assert_eq!(json["error"], "File validation failed");
    assert_eq!(json["code"], "VALIDATION_FAILED");
    assert_eq!(json["details"][0], "Only ZIP files are supported");
    assert!(app.store.list_projects().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_rejects_text_renamed_as_zip() {
    let app = TestApp::new();

    let response = app.upload("notes.zip", b"just some notes").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let json = response.json();
    assert_eq!(json["code"], "VALIDATION_FAILED");
    assert_eq!(json["details"], serde_json::json!(["File is not a valid ZIP archive"]));
    assert!(app.store.list_projects().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_corrupt_archive() {
    let app = TestApp::new();

    let response = app.upload("broken.zip", b"PK\x03\x04not really a zip").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json()["code"], "EXTRACTION_FAILED");

    let projects = app.store.list_projects().await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].status, ProjectStatus::Error);
}

#[tokio::test]
async fn test_upload_runs_to_completion_and_downloads() {
    let app = TestApp::new();

    let response = app.upload("notes.zip", &cordova_zip()).await;
    assert_eq!(response.status, StatusCode::OK);
    let json = response.json();
    assert_eq!(json["nextStep"], "automatic_analysis");
    assert_eq!(json["project"]["name"], "notes");
    assert_eq!(json["project"]["originalFileName"], "notes.zip");
    let id = json["project"]["id"].as_u64().unwrap();

    let project = app.wait_for_status(id, "completed").await;
    assert_eq!(project["progress"], 100);
    assert_eq!(project["framework"], "cordova");
    assert_eq!(project["analysis"]["packageName"], "com.example.notes");
    assert!(project["apkSize"].as_u64().unwrap() > 0);

    let download = app
        .request(Method::GET, &format!("/api/projects/{}/download", id))
        .await;
    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(
        download.headers[header::CONTENT_TYPE],
        "application/vnd.android.package-archive"
    );
    assert_eq!(
        download.headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"notes-release.apk\""
    );
    assert!(download.body.starts_with(b"PK"));

    let logs = app
        .request(Method::GET, &format!("/api/projects/{}/logs", id))
        .await
        .json();
    let messages: Vec<&str> = logs
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["message"].as_str().unwrap())
        .collect();
    assert!(messages[0].starts_with("File upload started: notes.zip"));
    assert!(messages.contains(&"STEP 4/4: Installing build tools..."));
    assert_eq!(
        messages.last().unwrap(),
        &"APK generation completed successfully! Ready for download"
    );
}

#[tokio::test]
async fn test_flutter_upload_runs_every_setup_step() {
    let app = TestApp::new();
    let bytes = zip_bytes(&[
        ("pubspec.yaml", "name: demo\nversion: 2.0.0+5\n"),
        ("lib/main.dart", "void main() {}\n"),
    ]);

    let response = app.upload("demo.zip", &bytes).await;
    assert_eq!(response.status, StatusCode::OK);
    let id = response.json()["project"]["id"].as_u64().unwrap();

    let project = app.wait_for_status(id, "completed").await;
    assert_eq!(project["framework"], "flutter");
    assert_eq!(project["analysis"]["buildConfig"]["versionName"], "2.0.0");
    assert_eq!(project["analysis"]["buildConfig"]["versionCode"], 5);
    assert_eq!(project["analysis"]["missingFiles"], serde_json::json!([]));
    assert!(project["apkSize"].as_u64().unwrap() > 0);

    let messages: Vec<String> = app
        .store
        .list_logs(id)
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.message)
        .collect();
    for step in 1..=4 {
        let prefix = format!("STEP {}/4: ", step);
        assert!(
            messages.iter().any(|line| line.starts_with(&prefix)),
            "missing {}",
            prefix
        );
    }
    assert!(messages.contains(&"Project setup completed successfully! Ready for APK build.".to_string()));
}

#[tokio::test]
async fn test_download_name_is_header_safe() {
    let app = TestApp::new();
    let project = app
        .store
        .create_project(NewProject::from_upload("a\".zip", 4))
        .await
        .unwrap();
    assert_eq!(project.name, "a\"");
    let apk = app.temp.path().join("a.apk");
    std::fs::write(&apk, b"PK\x03\x04").unwrap();
    app.store
        .update_project(
            project.id,
            ProjectUpdate::new()
                .status(ProjectStatus::Completed)
                .artifact(apk.to_string_lossy(), 4),
        )
        .await
        .unwrap();

    let download = app
        .request(Method::GET, &format!("/api/projects/{}/download", project.id))
        .await;

    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(
        download.headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"a_-release.apk\""
    );
}

#[tokio::test]
async fn test_unknown_project_routes() {
    let app = TestApp::new();

    for (method, uri) in [
        (Method::GET, "/api/projects/42"),
        (Method::POST, "/api/projects/42/analyze"),
        (Method::POST, "/api/projects/42/setup"),
        (Method::POST, "/api/projects/42/build"),
        (Method::POST, "/api/projects/42/stop"),
    ] {
        let response = app.request(method.clone(), uri).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{} {}", method, uri);
        assert_eq!(response.json()["error"], "Project not found");
    }

    let download = app.request(Method::GET, "/api/projects/42/download").await;
    assert_eq!(download.status, StatusCode::NOT_FOUND);
    assert_eq!(download.json()["error"], "APK not found");

    let logs = app.request(Method::GET, "/api/projects/42/logs").await;
    assert_eq!(logs.status, StatusCode::OK);
    assert_eq!(logs.json(), serde_json::json!([]));
}

#[tokio::test]
async fn test_setup_requires_analysis() {
    let app = TestApp::new();
    let project = app
        .store
        .create_project(NewProject::from_upload("a.zip", 10))
        .await
        .unwrap();

    let response = app
        .request(Method::POST, &format!("/api/projects/{}/setup", project.id))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "Project must be analyzed first");
}

#[tokio::test]
async fn test_manual_phases() {
    let app = TestApp::new();
    let project = app
        .store
        .create_project(NewProject::from_upload("site.zip", 10))
        .await
        .unwrap();
    app.store
        .update_project(project.id, ProjectUpdate::new().status(ProjectStatus::Extracted))
        .await
        .unwrap();
    let dir = app.orchestrator().context().files.project_path(project.id);
    support::write_file(&dir, "pubspec.yaml", "name: site\n");

    let analyze = app
        .request(Method::POST, &format!("/api/projects/{}/analyze", project.id))
        .await;
    assert_eq!(analyze.status, StatusCode::OK);
    let analysis = &analyze.json()["analysis"];
    assert_eq!(analysis["framework"], "flutter");
    assert_eq!(analysis["missingFiles"], serde_json::json!(["lib/main.dart"]));

    let setup = app
        .request(Method::POST, &format!("/api/projects/{}/setup", project.id))
        .await;
    assert_eq!(setup.status, StatusCode::OK);
    let json = setup.json();
    assert_eq!(json["success"], true);
    assert_eq!(
        json["details"],
        serde_json::json!({
            "dependencies": true,
            "missingFiles": true,
            "sdkSetup": true,
            "buildTools": true
        })
    );
    assert!(dir.join("lib/main.dart").exists());

    let build = app
        .request(Method::POST, &format!("/api/projects/{}/build", project.id))
        .await;
    assert_eq!(build.status, StatusCode::OK);
    let result = &build.json()["buildResult"];
    assert_eq!(result["success"], true);
    assert!(result["apkPath"]
        .as_str()
        .unwrap()
        .ends_with("build/outputs/apk/release/app-release.apk"));
    assert!(result["logs"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("Flutter Build Process:")));

    let stored = app.store.get_project(project.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ProjectStatus::Completed);
}

#[tokio::test]
async fn test_stop_then_logs_and_delete() {
    let app = TestApp::new();
    let project = app
        .store
        .create_project(NewProject::from_upload("a.zip", 10))
        .await
        .unwrap();

    let stop = app
        .request(Method::POST, &format!("/api/projects/{}/stop", project.id))
        .await;
    assert_eq!(stop.status, StatusCode::OK);
    assert_eq!(stop.json()["success"], true);
    assert!(app.orchestrator().is_stop_requested(project.id).await);

    let logs_uri = format!("/api/projects/{}/logs", project.id);
    assert_eq!(app.request(Method::GET, &logs_uri).await.json().as_array().unwrap().len(), 1);
    let cleared = app.request(Method::DELETE, &logs_uri).await;
    assert_eq!(cleared.json(), serde_json::json!({ "success": true }));
    assert_eq!(app.request(Method::GET, &logs_uri).await.json(), serde_json::json!([]));

    let uri = format!("/api/projects/{}", project.id);
    let deleted = app.request(Method::DELETE, &uri).await;
    assert_eq!(
        deleted.json(),
        serde_json::json!({ "success": true, "deleted": true })
    );
    assert_eq!(app.request(Method::GET, &uri).await.status, StatusCode::NOT_FOUND);

    let again = app.request(Method::DELETE, &uri).await;
    assert_eq!(again.json()["deleted"], false);
}

#[tokio::test]
async fn test_list_projects_in_id_order() {
    let app = TestApp::new();
    for name in ["a.zip", "b.zip", "c.zip"] {
        app.store
            .create_project(NewProject::from_upload(name, 1))
            .await
            .unwrap();
    }

    let json = app.request(Method::GET, "/api/projects").await.json();
    let ids: Vec<u64> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}
