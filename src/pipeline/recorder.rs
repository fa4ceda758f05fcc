use super::context::PipelineContext;
use super::error::PhaseError;
use super::phase::{Phase, PhaseRun};
use crate::progress::ProgressEvent;
use crate::store::{LogLevel, ProjectId, ProjectStatus, ProjectUpdate};
use crate::tools::{ToolInvocation, ToolOutcome};
use tracing::debug;

/// Writes a phase's log lines and progress for one project.
///
/// Every progress write goes through the run's floor, so a run never
/// publishes a lower value than one it already published.
pub struct PhaseRecorder<'a> {
    context: &'a PipelineContext,
    project_id: ProjectId,
    phase: Phase,
    run: PhaseRun,
    lines: Vec<String>,
}

impl<'a> PhaseRecorder<'a> {
    pub fn new(context: &'a PipelineContext, project_id: ProjectId, phase: Phase, run: PhaseRun) -> Self {
        Self {
            context,
            project_id,
            phase,
            run,
            lines: Vec::new(),
        }
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn run(&self) -> PhaseRun {
        self.run
    }

    pub fn context(&self) -> &'a PipelineContext {
        self.context
    }

    pub async fn log(&mut self, level: LogLevel, message: impl Into<String>) -> Result<(), PhaseError> {
        let message = message.into();
        debug!(project_id = self.project_id, phase = %self.phase, %level, "{}", message);
        self.context
            .store
            .append_log(self.project_id, level, message.clone())
            .await?;
        self.lines.push(message);
        Ok(())
    }

    pub async fn info(&mut self, message: impl Into<String>) -> Result<(), PhaseError> {
        self.log(LogLevel::Info, message).await
    }

    pub async fn warning(&mut self, message: impl Into<String>) -> Result<(), PhaseError> {
        self.log(LogLevel::Warning, message).await
    }

    pub async fn error(&mut self, message: impl Into<String>) -> Result<(), PhaseError> {
        self.log(LogLevel::Error, message).await
    }

    /// Writes `nominal` progress, clamped to the run floor, and optionally a
    /// new status.
    pub async fn advance(&mut self, status: Option<ProjectStatus>, nominal: u8) -> Result<(), PhaseError> {
        let progress = self.run.clamp(nominal);
        let mut update = ProjectUpdate::new().progress(progress);
        if let Some(status) = status {
            update = update.status(status);
        }
        self.apply(update).await
    }

    /// Applies an arbitrary update. A progress value in it is clamped to the
    /// run floor.
    pub async fn apply(&mut self, mut update: ProjectUpdate) -> Result<(), PhaseError> {
        if let Some(progress) = update.progress {
            update.progress = Some(self.run.clamp(progress));
        }
        let project = self
            .context
            .store
            .update_project(self.project_id, update)
            .await?
            .ok_or(PhaseError::ProjectNotFound(self.project_id))?;

        self.context.progress.on_progress(&ProgressEvent::StatusChanged {
            project_id: self.project_id,
            status: project.status,
            progress: project.progress,
        });
        Ok(())
    }

    /// Marks the project as failed without lowering its progress.
    pub async fn fail(&mut self) -> Result<(), PhaseError> {
        let floor = self.run.floor();
        self.advance(Some(ProjectStatus::Error), floor).await
    }

    /// Runs a tool through the configured probe. Soft outcomes come back as
    /// values; only internal faults are errors.
    pub async fn run_tool(&self, invocation: &ToolInvocation) -> Result<ToolOutcome, PhaseError> {
        let outcome = self.context.probe.run(invocation).await?;
        self.context.progress.on_progress(&ProgressEvent::ToolFinished {
            project_id: self.project_id,
            tool: invocation.command_line(),
            outcome: outcome.label(),
        });
        Ok(outcome)
    }

    /// Log messages written so far, in order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}
