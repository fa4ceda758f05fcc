//! Subcommand entry points. Each returns the process exit code.

use super::commands::{AnalyzeArgs, ServeArgs};
use super::output::OutputFormatter;
use crate::config::ForgeConfig;
use crate::detection::FrameworkAnalyzer;
use crate::fs::FileStore;
use crate::pipeline::{PhaseOrchestrator, PipelineContext};
use crate::server::{self, AppState};
use crate::store::InMemoryProjectStore;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

pub async fn handle_serve(args: &ServeArgs) -> i32 {
    match serve(args).await {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

/// Applies CLI overrides on top of the environment configuration.
pub fn resolve_config(args: &ServeArgs) -> ForgeConfig {
    let mut config = ForgeConfig::default();
    if let Some(bind) = &args.bind {
        config.bind = bind.clone();
    }
    if let Some(dir) = &args.uploads_dir {
        config.uploads_dir = dir.clone();
    }
    if let Some(dir) = &args.builds_dir {
        config.builds_dir = dir.clone();
    }
    if args.offline_tools {
        config.run_tools = false;
    }
    config
}

async fn serve(args: &ServeArgs) -> Result<()> {
    let config = resolve_config(args);
    config.validate().context("Invalid configuration")?;
    let addr = config.bind_addr()?;
    info!("{}", config);

    let files = Arc::new(FileStore::new(&config.uploads_dir, &config.builds_dir));
    files
        .init()
        .await
        .context("Failed to create storage directories")?;

    let context = PipelineContext::with_defaults(
        Arc::new(InMemoryProjectStore::new()),
        files,
        config.tool_probe(),
    )
    .with_config(config.pipeline_config());

    let orchestrator = PhaseOrchestrator::start(context);
    let state = AppState::new(orchestrator, config.max_upload_bytes());

    server::serve(addr, state)
        .await
        .with_context(|| format!("Server on {} failed", addr))
}

pub async fn handle_analyze(args: &AnalyzeArgs, quiet: bool) -> i32 {
    match analyze(args, quiet).await {
        Ok(valid) => {
            if valid {
                0
            } else {
                2
            }
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

/// Prints the analysis; returns whether the project structure is valid.
async fn analyze(args: &AnalyzeArgs, quiet: bool) -> Result<bool> {
    let path = args.path.clone().unwrap_or_else(|| PathBuf::from("."));
    let path = path
        .canonicalize()
        .with_context(|| format!("Project path {} not found", path.display()))?;
    if !path.is_dir() {
        anyhow::bail!("{} is not a directory", path.display());
    }

    info!(path = %path.display(), "Analyzing project");
    let analysis = FrameworkAnalyzer::new()
        .analyze(&path)
        .await
        .context("Analysis failed")?;

    let output = OutputFormatter::new(args.format.into()).format(&analysis)?;
    if !quiet || !analysis.has_valid_structure {
        println!("{}", output);
    }
    Ok(analysis.has_valid_structure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::OutputFormatArg;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_resolve_config_applies_overrides() {
        let args = ServeArgs {
            bind: Some("127.0.0.1:7000".to_string()),
            uploads_dir: None,
            builds_dir: Some(PathBuf::from("/srv/builds")),
            offline_tools: true,
        };

        let config = resolve_config(&args);

        assert_eq!(config.bind, "127.0.0.1:7000");
        assert_eq!(config.builds_dir, PathBuf::from("/srv/builds"));
        assert!(!config.run_tools);
    }

    #[tokio::test]
    async fn test_analyze_valid_project() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("pubspec.yaml"), "name: demo\n").unwrap();
        std::fs::create_dir_all(dir.path().join("lib")).unwrap();
        std::fs::write(dir.path().join("lib/main.dart"), "void main() {}\n").unwrap();

        let args = AnalyzeArgs {
            path: Some(dir.path().to_path_buf()),
            format: OutputFormatArg::Json,
        };
        assert_eq!(handle_analyze(&args, true).await, 0);
    }

    #[tokio::test]
    async fn test_analyze_missing_path() {
        let args = AnalyzeArgs {
            path: Some(PathBuf::from("/definitely/not/here")),
            format: OutputFormatArg::Human,
        };
        assert_eq!(handle_analyze(&args, true).await, 1);
    }
}
