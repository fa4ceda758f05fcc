use super::builder::{ApkBuilder, BuildReport};
use super::context::PipelineContext;
use super::error::PhaseError;
use super::locks::ProjectLocks;
use super::packager::{ApkPackager, PackagedArtifact};
use super::phase::{marks, Phase, PhaseRun};
use super::phase_trait::StepContext;
use super::queue::{spawn_dispatcher, PhaseQueue, PhaseTask};
use super::recorder::PhaseRecorder;
use super::steps::setup_steps;
use crate::detection::ProjectAnalysis;
use crate::progress::ProgressEvent;
use crate::store::{LogLevel, NewProject, Project, ProjectId, ProjectStatus, ProjectUpdate};
use crate::util::format_file_size;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Which setup steps completed, keyed the way the setup endpoint reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupDetails {
    pub dependencies: bool,
    pub missing_files: bool,
    pub sdk_setup: bool,
    pub build_tools: bool,
}

impl SetupDetails {
    fn mark(&mut self, index: usize) {
        match index {
            0 => self.dependencies = true,
            1 => self.missing_files = true,
            2 => self.sdk_setup = true,
            _ => self.build_tools = true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetupReport {
    pub details: SetupDetails,
    pub logs: Vec<String>,
}

/// Drives projects through upload, analysis, setup and build.
///
/// Manual calls run one phase and return its result. Automatic runs, started
/// by an upload, chain each successful phase into the next through the
/// [`PhaseQueue`]. Every phase of a project holds that project's lock, so at
/// most one phase is in flight per project.
pub struct PhaseOrchestrator {
    context: PipelineContext,
    queue: PhaseQueue,
    locks: ProjectLocks,
    stop_requests: Mutex<HashSet<ProjectId>>,
    packager: ApkPackager,
}

impl PhaseOrchestrator {
    /// Creates the orchestrator and spawns its queue dispatcher. Must be
    /// called inside a Tokio runtime.
    pub fn start(context: PipelineContext) -> Arc<Self> {
        let (queue, receiver) = PhaseQueue::channel();
        let packager = ApkPackager::new(context.config.clone());
        let orchestrator = Arc::new(Self {
            context,
            queue,
            locks: ProjectLocks::new(),
            stop_requests: Mutex::new(HashSet::new()),
            packager,
        });
        spawn_dispatcher(Arc::downgrade(&orchestrator), receiver);
        orchestrator
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Stores an already validated upload, extracts it into the project's
    /// working directory and schedules automatic analysis.
    pub async fn handle_upload(&self, file_name: &str, bytes: &[u8]) -> Result<Project, PhaseError> {
        let ctx = &self.context;
        let size = bytes.len() as u64;
        let project = ctx
            .store
            .create_project(NewProject::from_upload(file_name, size))
            .await?;
        let id = project.id;
        info!(project_id = id, file = file_name, size, "Upload received");

        // Held through extraction, same as any phase on this project.
        let _guard = self.locks.acquire(id).await;
        self.require_project(id).await?;

        let mut recorder = PhaseRecorder::new(ctx, id, Phase::Analysis, PhaseRun::automatic(0));
        recorder.advance(None, marks::UPLOAD_CREATED).await?;
        recorder
            .info(format!(
                "File upload started: {} ({})",
                file_name,
                format_file_size(size)
            ))
            .await?;

        let saved = match ctx.files.save_upload(bytes, file_name).await {
            Ok(path) => path,
            Err(e) => {
                recorder.error(format!("Upload failed: {}", e)).await?;
                recorder.fail().await?;
                return Err(PhaseError::Files(e));
            }
        };
        let saved_name = saved
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        recorder
            .info(format!("File saved successfully: {}", saved_name))
            .await?;
        recorder.advance(None, marks::UPLOAD_SAVED).await?;

        recorder.info("Extracting ZIP file...").await?;
        let extracted = match ctx.files.project_directory(id).await {
            Ok(dir) => ctx
                .files
                .extract_archive(&saved, &dir)
                .await
                .map(|count| (dir, count)),
            Err(e) => Err(e),
        };
        match extracted {
            Ok((dir, count)) => {
                recorder
                    .info(format!(
                        "ZIP file extracted successfully to: {} ({} files)",
                        dir.display(),
                        count
                    ))
                    .await?;
            }
            Err(e) => {
                recorder.error(format!("ZIP extraction failed: {}", e)).await?;
                recorder.fail().await?;
                return Err(PhaseError::Extraction {
                    project_id: id,
                    source: e,
                });
            }
        }
        recorder
            .advance(Some(ProjectStatus::Extracted), marks::EXTRACTED)
            .await?;

        self.schedule(id, Phase::Analysis, ProjectStatus::Extracted, recorder.run().floor())
            .await;
        self.require_project(id).await
    }

    /// Runs analysis on demand.
    pub async fn analyze(&self, id: ProjectId) -> Result<ProjectAnalysis, PhaseError> {
        let _guard = self.locks.acquire(id).await;
        let project = self.begin_manual(id).await?;
        let mut recorder = PhaseRecorder::new(
            &self.context,
            id,
            Phase::Analysis,
            PhaseRun::manual(project.progress),
        );
        self.analysis_phase(&mut recorder).await
    }

    /// Runs the four setup steps on demand. Requires a stored analysis.
    pub async fn setup(&self, id: ProjectId) -> Result<SetupReport, PhaseError> {
        let _guard = self.locks.acquire(id).await;
        let project = self.begin_manual(id).await?;
        let analysis = project.analysis.ok_or(PhaseError::NotAnalyzed)?;
        let mut recorder =
            PhaseRecorder::new(&self.context, id, Phase::Setup, PhaseRun::manual(project.progress));
        self.setup_phase(&mut recorder, &analysis).await
    }

    /// Builds the artifact on demand. Phase failures are reported in the
    /// returned report; only an unknown project is an error.
    pub async fn build(&self, id: ProjectId) -> Result<BuildReport, PhaseError> {
        let _guard = self.locks.acquire(id).await;
        let project = self.begin_manual(id).await?;
        let mut recorder =
            PhaseRecorder::new(&self.context, id, Phase::Build, PhaseRun::manual(project.progress));
        let result = self.build_phase(&mut recorder).await;
        let logs = recorder.into_lines();
        Ok(match result {
            Ok(artifact) => BuildReport::succeeded(&artifact, logs),
            Err(e) => BuildReport::failed(e.details(), logs),
        })
    }

    /// Records a stop request. The phase in flight finishes; no automatic
    /// continuation is scheduled or started afterwards.
    pub async fn request_stop(&self, id: ProjectId) -> Result<(), PhaseError> {
        self.require_project(id).await?;
        self.stop_requests.lock().await.insert(id);
        self.context
            .store
            .append_log(
                id,
                LogLevel::Warning,
                "Stop requested - automatic processing will halt after the current phase"
                    .to_string(),
            )
            .await?;
        info!(project_id = id, "Stop requested");
        Ok(())
    }

    pub async fn is_stop_requested(&self, id: ProjectId) -> bool {
        self.stop_requests.lock().await.contains(&id)
    }

    /// Removes the working directory, logs and record. Waits for any phase in
    /// flight. Returns whether a record existed.
    pub async fn delete_project(&self, id: ProjectId) -> Result<bool, PhaseError> {
        let existed = {
            let _guard = self.locks.acquire(id).await;
            let ctx = &self.context;
            ctx.files.delete_directory(&ctx.files.project_path(id)).await;
            ctx.store.clear_logs(id).await?;
            ctx.store.delete_project(id).await?
        };
        self.locks.forget(id).await;
        self.stop_requests.lock().await.remove(&id);
        info!(project_id = id, existed, "Project deleted");
        Ok(existed)
    }

    /// Executes a queued continuation. Called by the dispatcher.
    pub async fn run_task(&self, task: PhaseTask) {
        let id = task.project_id;
        let _guard = self.locks.acquire(id).await;

        if self.is_stop_requested(id).await {
            info!(project_id = id, phase = %task.phase, "Stop requested, dropping continuation");
            return;
        }
        let project = match self.context.store.get_project(id).await {
            Ok(Some(project)) => project,
            Ok(None) => {
                debug!(project_id = id, phase = %task.phase, "Project gone, dropping continuation");
                return;
            }
            Err(e) => {
                warn!(project_id = id, error = %e, "Could not load project for continuation");
                return;
            }
        };
        if project.status != task.expected_status {
            debug!(
                project_id = id,
                phase = %task.phase,
                expected = %task.expected_status,
                actual = %project.status,
                "Status moved on, dropping continuation"
            );
            return;
        }

        let mut recorder =
            PhaseRecorder::new(&self.context, id, task.phase, PhaseRun::automatic(task.floor));
        let result = match task.phase {
            Phase::Analysis => self
                .analysis_phase(&mut recorder)
                .await
                .map(|analysis| analysis.has_valid_structure),
            Phase::Setup => match project.analysis {
                Some(analysis) => self.setup_phase(&mut recorder, &analysis).await.map(|_| true),
                None => Err(PhaseError::NotAnalyzed),
            },
            Phase::Build => self.build_phase(&mut recorder).await.map(|_| true),
        };

        match result {
            Ok(true) => {
                if let Some((next, expected)) = continuation(task.phase) {
                    self.schedule(id, next, expected, recorder.run().floor()).await;
                }
            }
            Ok(false) => debug!(project_id = id, phase = %task.phase, "Automatic run ended"),
            Err(e) => warn!(project_id = id, phase = %task.phase, error = %e, "Automatic phase failed"),
        }
    }

    async fn schedule(&self, id: ProjectId, phase: Phase, expected_status: ProjectStatus, floor: u8) {
        if self.is_stop_requested(id).await {
            info!(project_id = id, %phase, "Stop requested, not scheduling");
            return;
        }
        self.queue.enqueue(PhaseTask {
            project_id: id,
            phase,
            expected_status,
            floor,
        });
    }

    async fn require_project(&self, id: ProjectId) -> Result<Project, PhaseError> {
        self.context
            .store
            .get_project(id)
            .await?
            .ok_or(PhaseError::ProjectNotFound(id))
    }

    /// Loads the project for a manual call and clears any stop request.
    async fn begin_manual(&self, id: ProjectId) -> Result<Project, PhaseError> {
        let project = self.require_project(id).await?;
        if self.stop_requests.lock().await.remove(&id) {
            debug!(project_id = id, "Stop request cleared by manual call");
        }
        Ok(project)
    }

    fn started(&self, recorder: &PhaseRecorder<'_>) -> Instant {
        self.context.progress.on_progress(&ProgressEvent::PhaseStarted {
            project_id: recorder.project_id(),
            phase: recorder.phase(),
        });
        Instant::now()
    }

    fn completed(&self, recorder: &PhaseRecorder<'_>, start: Instant) {
        self.context.progress.on_progress(&ProgressEvent::PhaseComplete {
            project_id: recorder.project_id(),
            phase: recorder.phase(),
            duration: start.elapsed(),
        });
    }

    /// Logs the failure, marks the project `error` and emits the event.
    async fn failed(&self, recorder: &mut PhaseRecorder<'_>, message: String, error: &PhaseError) {
        if let Err(e) = recorder.error(message).await {
            warn!(project_id = recorder.project_id(), error = %e, "Could not log phase failure");
        }
        if let Err(e) = recorder.fail().await {
            warn!(project_id = recorder.project_id(), error = %e, "Could not mark project failed");
        }
        self.context.progress.on_progress(&ProgressEvent::PhaseFailed {
            project_id: recorder.project_id(),
            phase: recorder.phase(),
            error: error.to_string(),
        });
    }

    async fn analysis_phase(
        &self,
        recorder: &mut PhaseRecorder<'_>,
    ) -> Result<ProjectAnalysis, PhaseError> {
        let start = self.started(recorder);
        let opening = if recorder.run().is_automatic() {
            "Automatically starting project analysis..."
        } else {
            "Starting project analysis..."
        };
        recorder.info(opening).await?;
        recorder
            .advance(Some(ProjectStatus::Analyzing), marks::ANALYZING)
            .await?;

        let dir = self.context.files.project_path(recorder.project_id());
        let analysis = match self.context.analyzer.analyze(&dir).await {
            Ok(analysis) => analysis,
            Err(e) => {
                let error = PhaseError::from(e);
                self.failed(recorder, format!("Analysis failed: {}", error), &error)
                    .await;
                return Err(error);
            }
        };

        let summary = format!("Analysis complete. Framework detected: {}", analysis.framework);
        if analysis.has_valid_structure {
            recorder
                .apply(
                    ProjectUpdate::new()
                        .status(ProjectStatus::Analyzed)
                        .progress(marks::ANALYZED)
                        .analysis(analysis.clone()),
                )
                .await?;
            recorder.info(summary).await?;
        } else {
            recorder
                .apply(
                    ProjectUpdate::new()
                        .status(ProjectStatus::Error)
                        .analysis(analysis.clone()),
                )
                .await?;
            recorder.error(summary).await?;
        }
        for error in &analysis.errors {
            recorder.error(error.clone()).await?;
        }

        self.completed(recorder, start);
        Ok(analysis)
    }

    async fn setup_phase(
        &self,
        recorder: &mut PhaseRecorder<'_>,
        analysis: &ProjectAnalysis,
    ) -> Result<SetupReport, PhaseError> {
        let start = self.started(recorder);
        let opening = if recorder.run().is_automatic() {
            "Automatically starting comprehensive project setup..."
        } else {
            "Starting comprehensive project setup..."
        };
        recorder.info(opening).await?;
        recorder
            .advance(Some(ProjectStatus::Setup), marks::SETUP_STARTED)
            .await?;

        let files = self.context.files.clone();
        let dir = match files.project_directory(recorder.project_id()).await {
            Ok(dir) => dir,
            Err(e) => {
                let error = PhaseError::from(e);
                self.failed(recorder, format!("Setup failed: {}", error), &error)
                    .await;
                return Err(error);
            }
        };
        let root = dir.join(&analysis.root_dir);
        let step = StepContext {
            dir: &dir,
            root: &root,
            analysis,
            files: &files,
        };

        let steps = setup_steps();
        let total = steps.len();
        let mut details = SetupDetails::default();

        for (index, setup_step) in steps.iter().enumerate() {
            let project_id = recorder.project_id();
            recorder
                .info(format!("STEP {}/{}: {}", index + 1, total, setup_step.title()))
                .await?;
            self.context.progress.on_progress(&ProgressEvent::StepStarted {
                project_id,
                index,
                total,
                title: setup_step.title().to_string(),
            });

            let outcome = setup_step.execute(&step, recorder).await;
            self.context.progress.on_progress(&ProgressEvent::StepComplete {
                project_id,
                index,
                success: outcome.is_ok(),
            });

            if let Err(e) = outcome {
                let error = match e {
                    PhaseError::StepFailed { .. } => e,
                    other => PhaseError::StepFailed {
                        step: setup_step.name().to_string(),
                        errors: other.details(),
                    },
                };
                let message = format!("{}: {}", error, error.details().join("; "));
                self.failed(recorder, message, &error).await;
                return Err(error);
            }

            details.mark(index);
            let nominal = marks::SETUP_STEPS
                .get(index)
                .copied()
                .unwrap_or(marks::SETUP_COMPLETE);
            recorder.advance(None, nominal).await?;
        }

        recorder
            .advance(Some(ProjectStatus::SetupComplete), marks::SETUP_COMPLETE)
            .await?;
        recorder
            .info("Project setup completed successfully! Ready for APK build.")
            .await?;

        self.completed(recorder, start);
        Ok(SetupReport {
            details,
            logs: recorder.lines().to_vec(),
        })
    }

    async fn build_phase(
        &self,
        recorder: &mut PhaseRecorder<'_>,
    ) -> Result<PackagedArtifact, PhaseError> {
        let start = self.started(recorder);
        match self.build_steps(recorder).await {
            Ok(artifact) => {
                self.completed(recorder, start);
                Ok(artifact)
            }
            Err(e) => {
                self.failed(recorder, format!("Build failed: {}", e), &e).await;
                Err(e)
            }
        }
    }

    async fn build_steps(
        &self,
        recorder: &mut PhaseRecorder<'_>,
    ) -> Result<PackagedArtifact, PhaseError> {
        let opening = if recorder.run().is_automatic() {
            "Automatically starting APK build process..."
        } else {
            "Starting APK build..."
        };
        recorder.info(opening).await?;
        recorder
            .apply(
                ProjectUpdate::new()
                    .status(ProjectStatus::Building)
                    .progress(marks::BUILD_STARTED)
                    .clear_artifact(),
            )
            .await?;

        let dir = self
            .context
            .files
            .project_directory(recorder.project_id())
            .await?;
        let analysis = self.context.analyzer.analyze(&dir).await?;
        recorder
            .apply(ProjectUpdate::new().analysis(analysis.clone()))
            .await?;

        if !analysis.framework.is_buildable() {
            return Err(PhaseError::UnsupportedFramework(
                analysis.framework.slug().to_string(),
            ));
        }

        let builder = ApkBuilder::new(&self.packager, self.context.config.run_build_command);
        let artifact = builder.run(recorder, &dir, &analysis).await?;

        recorder
            .info("APK generation completed successfully! Ready for download")
            .await?;
        recorder
            .apply(
                ProjectUpdate::new()
                    .status(ProjectStatus::Completed)
                    .progress(marks::COMPLETED)
                    .artifact(artifact_path(&artifact.path), artifact.size),
            )
            .await?;
        Ok(artifact)
    }
}

impl std::fmt::Debug for PhaseOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseOrchestrator")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Phase and required status of the automatic continuation after `phase`.
fn continuation(phase: Phase) -> Option<(Phase, ProjectStatus)> {
    let next = phase.next()?;
    let expected = match phase {
        Phase::Analysis => ProjectStatus::Analyzed,
        Phase::Setup => ProjectStatus::SetupComplete,
        Phase::Build => return None,
    };
    Some((next, expected))
}

fn artifact_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
