// Setup phase steps
//
// Each step is self-contained and runs in file-name order. Steps report
// tool outcomes through the recorder's log; only internal faults fail a step.

#[path = "01_dependencies.rs"]
pub mod dependencies;
#[path = "02_missing_files.rs"]
pub mod missing_files;
#[path = "03_environment.rs"]
pub mod environment;
#[path = "04_build_tools.rs"]
pub mod build_tools;

use super::error::PhaseError;
use super::phase_trait::SetupStep;
use super::recorder::PhaseRecorder;
use crate::tools::{ToolInvocation, ToolOutcome};

pub use build_tools::BuildToolsStep;
pub use dependencies::DependenciesStep;
pub use environment::EnvironmentStep;
pub use missing_files::MissingFilesStep;

/// The setup steps in execution order.
pub fn setup_steps() -> Vec<Box<dyn SetupStep>> {
    vec![
        Box::new(DependenciesStep),
        Box::new(MissingFilesStep),
        Box::new(EnvironmentStep),
        Box::new(BuildToolsStep),
    ]
}

/// Runs a tool and logs `success` when it exits cleanly, or a line naming
/// the outcome otherwise. Returns the outcome for callers that branch on it.
pub(crate) async fn run_logged(
    recorder: &mut PhaseRecorder<'_>,
    invocation: &ToolInvocation,
    success: &str,
) -> Result<ToolOutcome, PhaseError> {
    let outcome = recorder.run_tool(invocation).await?;
    if outcome.is_success() {
        recorder.info(success).await?;
    } else {
        recorder
            .info(format!(
                "{} completed with status: {}",
                invocation.command_line(),
                outcome
            ))
            .await?;
    }
    Ok(outcome)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::detection::{analyze_blocking, AnalyzerConfig, ProjectAnalysis};
    use crate::fs::FileStore;
    use crate::pipeline::context::PipelineContext;
    use crate::store::{InMemoryProjectStore, NewProject, ProjectId, ProjectStore};
    use crate::tools::MockToolProbe;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    pub struct Harness {
        pub temp: TempDir,
        pub store: Arc<InMemoryProjectStore>,
        pub probe: Arc<MockToolProbe>,
        pub context: PipelineContext,
        pub project_id: ProjectId,
    }

    impl Harness {
        pub async fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let store = Arc::new(InMemoryProjectStore::new());
            let probe = Arc::new(MockToolProbe::new());
            let context = PipelineContext::with_defaults(
                store.clone(),
                Arc::new(FileStore::new(temp.path().join("uploads"), temp.path().join("builds"))),
                probe.clone(),
            );
            let project = store
                .create_project(NewProject::from_upload("demo.zip", 100))
                .await
                .unwrap();
            Self {
                temp,
                store,
                probe,
                context,
                project_id: project.id,
            }
        }

        /// Project working directory, kept apart from the store roots
        pub fn dir(&self) -> PathBuf {
            self.temp.path().join("project")
        }

        pub fn write(&self, relative: &str, content: &str) {
            let path = self.dir().join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }

        pub fn analyze(&self) -> ProjectAnalysis {
            std::fs::create_dir_all(self.dir()).unwrap();
            analyze_blocking(&self.dir(), &AnalyzerConfig::default()).unwrap()
        }
    }
}
