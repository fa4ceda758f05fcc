use crate::pipeline::error::PhaseError;
use crate::pipeline::phase_trait::{SetupStep, StepContext};
use crate::pipeline::recorder::PhaseRecorder;
use crate::stack::FrameworkId;
use crate::tools::ToolInvocation;
use async_trait::async_trait;

/// Probes Java plus the framework's own runtime, then reports the configured
/// SDK levels. A missing runtime is reported, never fatal.
pub struct EnvironmentStep;

#[async_trait]
impl SetupStep for EnvironmentStep {
    fn title(&self) -> &'static str {
        "Setting up required SDKs..."
    }

    fn name(&self) -> &'static str {
        "SDK setup"
    }

    async fn execute(
        &self,
        step: &StepContext<'_>,
        recorder: &mut PhaseRecorder<'_>,
    ) -> Result<(), PhaseError> {
        let framework = &step.analysis.framework;

        recorder.info("Checking Java installation...").await?;
        let java = ToolInvocation::new("java", &["-version"], step.root).timeout_secs(10);
        if recorder.run_tool(&java).await?.is_success() {
            recorder.info("Java runtime detected and available").await?;
        } else {
            recorder
                .info("Java environment setup required for Android builds")
                .await?;
        }

        if *framework == FrameworkId::ReactNative {
            let node = ToolInvocation::new("node", &["--version"], step.root).timeout_secs(5);
            let outcome = recorder.run_tool(&node).await?;
            if outcome.is_success() {
                let version = outcome.first_line().unwrap_or("unknown").to_string();
                recorder
                    .info(format!("Node.js environment ready: {}", version))
                    .await?;
            } else {
                recorder
                    .info("Node.js environment required for React Native builds")
                    .await?;
            }
        }

        if *framework == FrameworkId::Flutter {
            let flutter = ToolInvocation::new("flutter", &["--version"], step.root).timeout_secs(10);
            if recorder.run_tool(&flutter).await?.is_success() {
                recorder.info("Flutter SDK detected and available").await?;
            } else {
                recorder
                    .info("Flutter SDK environment required for Flutter builds")
                    .await?;
            }
        }

        let config = &step.analysis.build_config;
        recorder
            .info(format!("Target SDK configured: Android API {}", config.target_sdk))
            .await?;
        recorder
            .info(format!("Minimum SDK configured: Android API {}", config.min_sdk))
            .await?;
        Ok(())
    }
}
