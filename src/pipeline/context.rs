//! Long-lived collaborators shared by every phase

use std::sync::Arc;

use crate::detection::FrameworkAnalyzer;
use crate::fs::FileStore;
use crate::progress::{LoggingHandler, ProgressHandler};
use crate::store::ProjectStore;
use crate::tools::ToolProbe;

use super::config::PipelineConfig;

#[derive(Clone)]
pub struct PipelineContext {
    /// Project records and logs
    pub store: Arc<dyn ProjectStore>,

    /// Uploads and working directories
    pub files: Arc<FileStore>,

    pub analyzer: Arc<FrameworkAnalyzer>,

    /// External tool runner
    pub probe: Arc<dyn ToolProbe>,

    pub progress: Arc<dyn ProgressHandler>,

    pub config: PipelineConfig,
}

impl PipelineContext {
    pub fn new(
        store: Arc<dyn ProjectStore>,
        files: Arc<FileStore>,
        analyzer: Arc<FrameworkAnalyzer>,
        probe: Arc<dyn ToolProbe>,
        progress: Arc<dyn ProgressHandler>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            files,
            analyzer,
            probe,
            progress,
            config,
        }
    }

    /// Context with the default analyzer, tracing progress and default config
    pub fn with_defaults(
        store: Arc<dyn ProjectStore>,
        files: Arc<FileStore>,
        probe: Arc<dyn ToolProbe>,
    ) -> Self {
        Self::new(
            store,
            files,
            Arc::new(FrameworkAnalyzer::new()),
            probe,
            Arc::new(LoggingHandler),
            PipelineConfig::default(),
        )
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("files", &self.files)
            .field("probe", &self.probe.name())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryProjectStore;
    use crate::tools::OfflineToolProbe;
    use tempfile::TempDir;

    #[test]
    fn test_context_with_defaults() {
        let dir = TempDir::new().unwrap();
        let context = PipelineContext::with_defaults(
            Arc::new(InMemoryProjectStore::new()),
            Arc::new(FileStore::new(dir.path().join("u"), dir.path().join("b"))),
            Arc::new(OfflineToolProbe),
        )
        .with_config(PipelineConfig::new().with_build_command(false));

        assert_eq!(context.probe.name(), "offline");
        assert!(!context.config.run_build_command);
        assert!(format!("{:?}", context).contains("offline"));
    }
}
