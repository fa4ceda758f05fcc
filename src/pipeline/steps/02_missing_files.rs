use crate::pipeline::error::PhaseError;
use crate::pipeline::phase_trait::{SetupStep, StepContext};
use crate::pipeline::recorder::PhaseRecorder;
use crate::pipeline::templates::{boilerplate_for, essentials_for};
use crate::stack::FrameworkId;
use async_trait::async_trait;

/// Writes boilerplate for every file the analysis reported missing, plus the
/// framework's essential files when they are absent.
///
/// Existing files are never overwritten. A write failure does not stop the
/// step early; all failures are reported together.
pub struct MissingFilesStep;

impl MissingFilesStep {
    fn candidates(step: &StepContext<'_>) -> Vec<String> {
        let mut paths = step.analysis.missing_files.clone();
        for essential in essentials_for(&step.analysis.framework) {
            let rooted = step.analysis.rooted(essential);
            if !paths.contains(&rooted) {
                paths.push(rooted);
            }
        }
        paths
    }

    fn created_message(path: &str, framework: &FrameworkId) -> String {
        let name = path.rsplit('/').next().unwrap_or(path);
        match (framework, name) {
            (FrameworkId::Flutter, "pubspec.yaml") => "Created complete pubspec.yaml configuration".to_string(),
            (FrameworkId::Flutter, "main.dart") => "Created complete Flutter main.dart application".to_string(),
            (FrameworkId::ReactNative, "package.json") => "Created complete React Native package.json".to_string(),
            (FrameworkId::ReactNative, "index.js") => "Created React Native entry point".to_string(),
            (FrameworkId::Android, "build.gradle") => "Created Android build.gradle configuration".to_string(),
            (FrameworkId::Android, "AndroidManifest.xml") => "Created Android application manifest".to_string(),
            (FrameworkId::Cordova, "config.xml") => "Created Cordova configuration file".to_string(),
            _ => format!("Created missing file: {}", path),
        }
    }
}

#[async_trait]
impl SetupStep for MissingFilesStep {
    fn title(&self) -> &'static str {
        "Creating missing files and directories..."
    }

    fn name(&self) -> &'static str {
        "Missing files creation"
    }

    async fn execute(
        &self,
        step: &StepContext<'_>,
        recorder: &mut PhaseRecorder<'_>,
    ) -> Result<(), PhaseError> {
        recorder.info("Scanning project for missing essential files...").await?;

        let candidates = Self::candidates(step);
        let mut failures = Vec::new();

        for relative in &candidates {
            let path = step.dir.join(relative);
            if step.files.exists(&path).await {
                continue;
            }
            let content = boilerplate_for(relative, step.analysis);
            match step.files.write_file(&path, content).await {
                Ok(()) => {
                    recorder
                        .info(Self::created_message(relative, &step.analysis.framework))
                        .await?;
                }
                Err(e) => {
                    let message = format!("Failed to create {}: {}", relative, e);
                    recorder.error(message.clone()).await?;
                    failures.push(message);
                }
            }
        }

        if !failures.is_empty() {
            return Err(PhaseError::StepFailed {
                step: self.name().to_string(),
                errors: failures,
            });
        }

        recorder
            .info(format!(
                "Missing files analysis completed - {} files checked",
                candidates.len()
            ))
            .await?;
        Ok(())
    }
}
