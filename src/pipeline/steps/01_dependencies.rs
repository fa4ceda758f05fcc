use super::run_logged;
use crate::pipeline::error::PhaseError;
use crate::pipeline::phase_trait::{SetupStep, StepContext};
use crate::pipeline::recorder::PhaseRecorder;
use crate::stack::FrameworkId;
use crate::tools::ToolInvocation;
use async_trait::async_trait;

/// Installs or resolves the project's declared dependencies with the
/// framework's package manager.
pub struct DependenciesStep;

#[async_trait]
impl SetupStep for DependenciesStep {
    fn title(&self) -> &'static str {
        "Installing project dependencies..."
    }

    fn name(&self) -> &'static str {
        "Dependency installation"
    }

    async fn execute(
        &self,
        step: &StepContext<'_>,
        recorder: &mut PhaseRecorder<'_>,
    ) -> Result<(), PhaseError> {
        let root = step.root;
        match &step.analysis.framework {
            FrameworkId::Flutter => {
                recorder.info("Running flutter pub get...").await?;
                let invocation = ToolInvocation::new("flutter", &["pub", "get"], root).timeout_secs(60);
                run_logged(recorder, &invocation, "Flutter dependencies installed successfully").await?;
            }
            FrameworkId::ReactNative => {
                recorder.info("Running npm install...").await?;
                let invocation = ToolInvocation::new("npm", &["install"], root).timeout_secs(120);
                run_logged(recorder, &invocation, "NPM dependencies installed successfully").await?;
            }
            FrameworkId::Android => {
                recorder.info("Running gradle dependency resolution...").await?;
                let wrapper = root.join("gradlew");
                let program = if step.files.exists(&wrapper).await {
                    wrapper.to_string_lossy().into_owned()
                } else {
                    "gradle".to_string()
                };
                let invocation = ToolInvocation::new(program, &["dependencies"], root).timeout_secs(180);
                run_logged(recorder, &invocation, "Gradle dependencies resolved successfully").await?;
            }
            FrameworkId::Cordova if step.files.exists(&root.join("package.json")).await => {
                recorder.info("Running npm install...").await?;
                let invocation = ToolInvocation::new("npm", &["install"], root).timeout_secs(120);
                run_logged(recorder, &invocation, "NPM dependencies installed successfully").await?;
            }
            other => {
                recorder
                    .info(format!("Framework {} detected - dependencies analyzed", other))
                    .await?;
            }
        }
        Ok(())
    }
}
