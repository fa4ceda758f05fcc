//! apkforge - mobile project to APK conversion service
//!
//! Accepts a zipped mobile project, detects its framework, prepares the
//! working copy and packages an installable APK. Projects move through a
//! status state machine driven by [`pipeline::PhaseOrchestrator`].
//!
//! # Example Usage
//!
//! ```no_run
//! use apkforge::fs::FileStore;
//! use apkforge::pipeline::{PhaseOrchestrator, PipelineContext};
//! use apkforge::store::InMemoryProjectStore;
//! use apkforge::tools::OfflineToolProbe;
//! use std::sync::Arc;
//!
//! # async fn example(zip: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let context = PipelineContext::with_defaults(
//!     Arc::new(InMemoryProjectStore::new()),
//!     Arc::new(FileStore::new("uploads", "builds")),
//!     Arc::new(OfflineToolProbe),
//! );
//! let orchestrator = PhaseOrchestrator::start(context);
//!
//! let project = orchestrator.handle_upload("my-app.zip", &zip).await?;
//! let report = orchestrator.build(project.id).await?;
//! println!("APK at {:?}", report.apk_path);
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`fs`]: upload storage, extraction and filtered traversal
//! - [`detection`]: framework analysis
//! - [`tools`]: external tool invocation
//! - [`pipeline`]: phases, setup steps, build and packaging
//! - [`store`]: project records and logs
//! - [`server`]: HTTP API

pub mod cli;
pub mod config;
pub mod detection;
pub mod fs;
pub mod pipeline;
pub mod progress;
pub mod server;
pub mod stack;
pub mod store;
pub mod tools;
pub mod util;

pub use config::{ConfigError, ForgeConfig};
pub use detection::{AnalysisError, FrameworkAnalyzer, ProjectAnalysis};
pub use pipeline::{PhaseError, PhaseOrchestrator, PipelineContext};
pub use store::{InMemoryProjectStore, Project, ProjectStatus, ProjectStore};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_apkforge() {
        assert_eq!(NAME, "apkforge");
    }
}
