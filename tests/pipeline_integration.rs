//! Orchestrator behaviour across phases: chaining, progress, failures and
//! per-project serialization.

mod support;

use apkforge::fs::FileStore;
use apkforge::pipeline::{PhaseError, PhaseOrchestrator, PipelineConfig, PipelineContext};
use apkforge::progress::ProgressEvent;
use apkforge::store::{InMemoryProjectStore, NewProject, ProjectStatus, ProjectStore};
use apkforge::tools::{MockToolProbe, ToolOutcome};
use std::sync::Arc;
use support::{write_file, zip_bytes, RecordingHandler, TestApp};
use tempfile::TempDir;

fn react_native_zip() -> Vec<u8> {
    zip_bytes(&[
        (
            "package.json",
            r#"{"name":"weather","version":"1.4.0","dependencies":{"react":"18.2.0","react-native":"0.72.4"}}"#,
        ),
        ("index.js", "import App from './App';"),
        ("App.js", "export default function App() { return null; }"),
    ])
}

struct MockedPipeline {
    _temp: TempDir,
    store: Arc<InMemoryProjectStore>,
    probe: Arc<MockToolProbe>,
    progress: Arc<RecordingHandler>,
    orchestrator: Arc<PhaseOrchestrator>,
}

fn mocked_pipeline() -> MockedPipeline {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(InMemoryProjectStore::new());
    let probe = Arc::new(MockToolProbe::new());
    let progress = Arc::new(RecordingHandler::default());
    let context = PipelineContext::with_defaults(
        store.clone(),
        Arc::new(FileStore::new(
            temp.path().join("uploads"),
            temp.path().join("builds"),
        )),
        probe.clone(),
    )
    .with_progress(progress.clone())
    .with_config(PipelineConfig::new().with_build_command(false));

    MockedPipeline {
        _temp: temp,
        store,
        probe,
        progress,
        orchestrator: PhaseOrchestrator::start(context),
    }
}

async fn messages(store: &InMemoryProjectStore, id: u64) -> Vec<String> {
    store
        .list_logs(id)
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.message)
        .collect()
}

#[tokio::test]
async fn test_automatic_run_progress_never_regresses() {
    let app = TestApp::new();

    let response = app.upload("weather.zip", &react_native_zip()).await;
    let id = response.json()["project"]["id"].as_u64().unwrap();
    app.wait_for_status(id, "completed").await;

    let progress = app.progress.progress_of(id);
    assert_eq!(progress.first(), Some(&10));
    assert_eq!(progress.last(), Some(&100));
    assert!(
        progress.windows(2).all(|pair| pair[0] <= pair[1]),
        "progress regressed: {:?}",
        progress
    );
}

#[tokio::test]
async fn test_automatic_run_emits_each_phase_once() {
    let app = TestApp::new();

    let response = app.upload("weather.zip", &react_native_zip()).await;
    let id = response.json()["project"]["id"].as_u64().unwrap();
    app.wait_for_status(id, "completed").await;

    let completed: Vec<String> = app
        .progress
        .events()
        .into_iter()
        .filter_map(|event| match event {
            ProgressEvent::PhaseComplete {
                project_id, phase, ..
            } if project_id == id => Some(phase.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(completed, vec!["analysis", "setup", "build"]);
}

#[tokio::test]
async fn test_invalid_analysis_stops_the_chain() {
    let app = TestApp::new();
    let bytes = zip_bytes(&[("pubspec.yaml", "name: [broken\n")]);

    let response = app.upload("broken.zip", &bytes).await;
    let id = response.json()["project"]["id"].as_u64().unwrap();

    let project = app.wait_for_status(id, "error").await;
    assert_eq!(project["analysis"]["hasValidStructure"], false);
    assert_eq!(project["progress"], 30);
    assert!(project["apkPath"].is_null());

    let logs = messages(&app.store, id).await;
    assert!(logs.contains(&"Analysis complete. Framework detected: flutter".to_string()));
    assert!(!logs.iter().any(|line| line.contains("setup")));
}

#[tokio::test]
async fn test_setup_fault_marks_project_failed() {
    let pipeline = mocked_pipeline();
    let project = pipeline
        .store
        .create_project(NewProject::from_upload("app.zip", 1))
        .await
        .unwrap();
    let dir = pipeline.orchestrator.context().files.project_path(project.id);
    write_file(&dir, "pubspec.yaml", "name: app\n");
    write_file(&dir, "lib/main.dart", "void main() {}\n");
    pipeline.orchestrator.analyze(project.id).await.unwrap();

    pipeline.probe.add_fault("permission denied");
    let err = pipeline.orchestrator.setup(project.id).await.unwrap_err();

    let PhaseError::StepFailed { step, errors } = err else {
        panic!("unexpected error: {:?}", err);
    };
    assert_eq!(step, "Dependency installation");
    assert_eq!(errors, vec!["Failed to start flutter: permission denied"]);

    let stored = pipeline.store.get_project(project.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ProjectStatus::Error);
    assert_eq!(stored.progress, 50);

    let logs = messages(&pipeline.store, project.id).await;
    assert_eq!(
        logs.last().unwrap(),
        "Dependency installation failed: Failed to start flutter: permission denied"
    );
    assert!(!logs.iter().any(|line| line.starts_with("STEP 2/4")));
}

#[tokio::test]
async fn test_setup_reports_tool_output() {
    let pipeline = mocked_pipeline();
    let project = pipeline
        .store
        .create_project(NewProject::from_upload("app.zip", 1))
        .await
        .unwrap();
    let dir = pipeline.orchestrator.context().files.project_path(project.id);
    write_file(
        &dir,
        "package.json",
        r#"{"name":"app","dependencies":{"react-native":"0.72.0"}}"#,
    );
    write_file(&dir, "App.js", "");
    pipeline.orchestrator.analyze(project.id).await.unwrap();

    pipeline.probe.add_outcomes([
        ToolOutcome::success("added 812 packages"),
        ToolOutcome::success("openjdk 17"),
        ToolOutcome::success("v20.5.1\n"),
    ]);
    let report = pipeline.orchestrator.setup(project.id).await.unwrap();

    assert!(report.details.dependencies && report.details.build_tools);
    assert_eq!(
        pipeline.probe.command_lines(),
        vec!["npm install", "java -version", "node --version"]
    );
    assert!(report
        .logs
        .contains(&"Node.js environment ready: v20.5.1".to_string()));
    assert!(dir.join("index.js").exists());

    let stored = pipeline.store.get_project(project.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ProjectStatus::SetupComplete);
    assert_eq!(stored.progress, 65);
}

#[tokio::test]
async fn test_concurrent_manual_builds_do_not_interleave() {
    let pipeline = mocked_pipeline();
    let project = pipeline
        .store
        .create_project(NewProject::from_upload("site.zip", 1))
        .await
        .unwrap();
    let dir = pipeline.orchestrator.context().files.project_path(project.id);
    write_file(&dir, "index.html", "<html/>");
    write_file(&dir, "app.js", "console.log(1);");

    let id = project.id;
    let first = {
        let orchestrator = pipeline.orchestrator.clone();
        tokio::spawn(async move { orchestrator.build(id).await })
    };
    let second = {
        let orchestrator = pipeline.orchestrator.clone();
        tokio::spawn(async move { orchestrator.build(id).await })
    };
    assert!(first.await.unwrap().unwrap().success);
    assert!(second.await.unwrap().unwrap().success);

    let logs = messages(&pipeline.store, id).await;
    let starts: Vec<usize> = positions(&logs, "Starting APK build...");
    let ends: Vec<usize> = positions(&logs, "APK generation completed successfully! Ready for download");
    assert_eq!(starts.len(), 2);
    assert_eq!(ends.len(), 2);
    assert!(starts[0] < ends[0] && ends[0] < starts[1] && starts[1] < ends[1]);
}

fn positions(logs: &[String], line: &str) -> Vec<usize> {
    logs.iter()
        .enumerate()
        .filter(|(_, message)| message.as_str() == line)
        .map(|(index, _)| index)
        .collect()
}

#[tokio::test]
async fn test_manual_call_clears_stop_request() {
    let pipeline = mocked_pipeline();
    let project = pipeline
        .store
        .create_project(NewProject::from_upload("site.zip", 1))
        .await
        .unwrap();
    write_file(
        &pipeline.orchestrator.context().files.project_path(project.id),
        "index.html",
        "<html/>",
    );

    pipeline.orchestrator.request_stop(project.id).await.unwrap();
    assert!(pipeline.orchestrator.is_stop_requested(project.id).await);

    pipeline.orchestrator.analyze(project.id).await.unwrap();
    assert!(!pipeline.orchestrator.is_stop_requested(project.id).await);
}

#[tokio::test]
async fn test_build_failure_is_reported_not_raised() {
    let pipeline = mocked_pipeline();
    let project = pipeline
        .store
        .create_project(NewProject::from_upload("blocked.zip", 1))
        .await
        .unwrap();
    // A regular file where the working directory should be.
    let path = pipeline.orchestrator.context().files.project_path(project.id);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "not a directory").unwrap();

    let report = pipeline.orchestrator.build(project.id).await.unwrap();

    assert!(!report.success);
    assert!(report.apk_path.is_none());
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.logs.first().unwrap(), "Starting APK build...");
    assert!(report.logs.last().unwrap().starts_with("Build failed: "));

    let stored = pipeline.store.get_project(project.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ProjectStatus::Error);
    assert!(stored.apk_path.is_none());
    assert!(pipeline
        .progress
        .events()
        .iter()
        .any(|event| matches!(event, ProgressEvent::PhaseFailed { .. })));
}

#[tokio::test]
async fn test_failed_rebuild_drops_previous_artifact() {
    let pipeline = mocked_pipeline();
    let project = pipeline
        .store
        .create_project(NewProject::from_upload("site.zip", 1))
        .await
        .unwrap();
    let path = pipeline.orchestrator.context().files.project_path(project.id);
    write_file(&path, "index.html", "<html/>");

    assert!(pipeline.orchestrator.build(project.id).await.unwrap().success);
    let built = pipeline.store.get_project(project.id).await.unwrap().unwrap();
    assert!(built.apk_path.is_some());

    std::fs::remove_dir_all(&path).unwrap();
    std::fs::write(&path, "not a directory").unwrap();
    let report = pipeline.orchestrator.build(project.id).await.unwrap();
    assert!(!report.success);

    let stored = pipeline.store.get_project(project.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ProjectStatus::Error);
    assert!(stored.apk_path.is_none());
    assert!(stored.apk_size.is_none());
}
