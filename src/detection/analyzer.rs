use crate::detection::frameworks::{registry, ProjectFiles};
use crate::detection::tally;
use crate::detection::types::{ProjectAnalysis, ProjectType};
use crate::fs::{list_files, WalkConfig};
use crate::stack::{FrameworkId, LanguageId};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

pub const GENERIC_FALLBACK_WARNING: &str =
    "Framework not automatically detected - will use generic mobile project setup";

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Path does not exist: {0}")]
    PathNotFound(PathBuf),
    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Analysis task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, Default)]
pub struct AnalyzerConfig {
    pub walk: WalkConfig,
}

/// Produces a [`ProjectAnalysis`] for an extracted project tree.
///
/// Analysis never fails on project content: unreadable or malformed
/// manifests end up in `errors`, absent required files in `missing_files`.
/// Only a missing or non-directory root is reported as [`AnalysisError`].
#[derive(Debug, Clone, Default)]
pub struct FrameworkAnalyzer {
    config: AnalyzerConfig,
}

impl FrameworkAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub async fn analyze(&self, dir: &Path) -> Result<ProjectAnalysis, AnalysisError> {
        let dir = dir.to_path_buf();
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || analyze_blocking(&dir, &config))
            .await
            .map_err(|e| AnalysisError::Task(e.to_string()))?
    }
}

fn validate_root(dir: &Path) -> Result<(), AnalysisError> {
    if !dir.exists() {
        return Err(AnalysisError::PathNotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(AnalysisError::NotADirectory(dir.to_path_buf()));
    }
    Ok(())
}

/// Synchronous analysis core, also used by the CLI.
pub fn analyze_blocking(dir: &Path, config: &AnalyzerConfig) -> Result<ProjectAnalysis, AnalysisError> {
    let started = Instant::now();
    validate_root(dir)?;

    let files = list_files(dir, &config.walk);
    let view = ProjectFiles::new(dir, &files);

    let detected = registry()
        .into_iter()
        .find_map(|framework| framework.detect(&view).map(|base| (framework, base)));

    let mut analysis = match detected {
        Some((framework, base)) => {
            let scoped = view.scoped(&base);
            let mut analysis = ProjectAnalysis::new(
                framework.id(),
                framework.language(&scoped),
                framework.project_type(),
            );
            analysis.root_dir = scoped.base().to_string();
            debug!(framework = %framework.id(), root = %analysis.root_dir, "Framework detected");
            framework.analyze(&scoped, &mut analysis);
            analysis
        }
        None => {
            let mut analysis = ProjectAnalysis::new(
                FrameworkId::GenericMobile,
                LanguageId::Unknown,
                ProjectType::Unknown,
            );
            analysis.warnings.push(GENERIC_FALLBACK_WARNING.to_string());
            analysis
        }
    };

    analysis.project_stats = tally::tally(&files);
    analysis.source_structure = tally::source_structure(&files);
    let (deps, dev_deps) = (analysis.dependencies.len(), analysis.dev_dependencies.len());
    tally::finalize_stats(&mut analysis.project_stats, deps, dev_deps, &analysis.framework);
    analysis.has_valid_structure = analysis.errors.is_empty();

    info!(
        framework = %analysis.framework,
        files = files.len(),
        missing = analysis.missing_files.len(),
        errors = analysis.errors.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Project analysis complete"
    );
    Ok(analysis)
}
