use super::error::PhaseError;
use super::recorder::PhaseRecorder;
use crate::detection::ProjectAnalysis;
use crate::fs::FileStore;
use async_trait::async_trait;
use std::path::Path;

/// Inputs shared by all setup steps of one run.
pub struct StepContext<'a> {
    /// Project working directory
    pub dir: &'a Path,
    /// Manifest root inside the working directory
    pub root: &'a Path,
    pub analysis: &'a ProjectAnalysis,
    pub files: &'a FileStore,
}

/// One of the four setup steps.
///
/// Absent or failing external tools must not surface as errors here; return
/// `Err` only for internal faults such as a failed file write.
#[async_trait]
pub trait SetupStep: Send + Sync {
    /// Used in the `STEP i/4` log line
    fn title(&self) -> &'static str;

    /// Used in failure messages, e.g. "Dependency installation failed"
    fn name(&self) -> &'static str;

    async fn execute(
        &self,
        step: &StepContext<'_>,
        recorder: &mut PhaseRecorder<'_>,
    ) -> Result<(), PhaseError>;
}
