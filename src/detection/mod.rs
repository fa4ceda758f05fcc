pub mod analyzer;
pub mod frameworks;
pub mod parsers;
pub mod tally;
pub mod types;

pub use analyzer::{analyze_blocking, AnalysisError, AnalyzerConfig, FrameworkAnalyzer};
pub use types::{
    BuildConfig, ProjectAnalysis, ProjectStats, ProjectType, SizeBucket, SourceStructure,
    Toolchain, ANALYSIS_SCHEMA_VERSION,
};
