//! Phase pipeline that turns an uploaded project into an installable package
//!
//! The pipeline consists of three phases:
//! 1. Analysis - framework detection and structure validation
//! 2. Setup - dependencies, missing files, SDK probes, build tools
//! 3. Build - framework build sequence, packaging and verification
//!
//! [`PhaseOrchestrator`] runs phases manually or chains them automatically
//! after an upload.

pub mod builder;
pub mod config;
pub mod context;
pub mod error;
pub mod locks;
pub mod orchestrator;
pub mod packager;
pub mod phase;
pub mod phase_trait;
pub mod queue;
pub mod recorder;
pub mod steps;
pub mod templates;

pub use builder::{ApkBuilder, BuildReport};
pub use config::PipelineConfig;
pub use context::PipelineContext;
pub use error::{PackagingError, PhaseError};
pub use orchestrator::{PhaseOrchestrator, SetupDetails, SetupReport};
pub use packager::{ApkPackager, PackagedArtifact, APK_RELATIVE_PATH};
pub use phase::{marks, Phase, PhaseRun, Trigger};
pub use phase_trait::{SetupStep, StepContext};
pub use recorder::PhaseRecorder;
