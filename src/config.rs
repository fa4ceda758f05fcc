//! Service configuration
//!
//! Settings are loaded from environment variables with defaults. CLI flags
//! override individual values after loading.
//!
//! # Environment Variables
//!
//! - `APKFORGE_BIND`: listen address - default: "0.0.0.0:5000"
//! - `APKFORGE_UPLOADS_DIR`: where raw uploads are stored - default: "uploads"
//! - `APKFORGE_BUILDS_DIR`: parent of per-project working directories - default: "builds"
//! - `APKFORGE_MAX_UPLOAD_MB`: upload size limit in MiB - default: "500"
//! - `APKFORGE_RUN_TOOLS`: invoke external tools (true|false) - default: "true"
//! - `APKFORGE_TOOL_TIMEOUT_CAP`: upper bound for any tool timeout, seconds - default: "180"
//! - `APKFORGE_LOG_LEVEL`: logging level - default: "info"
//!
//! # Example
//!
//! ```no_run
//! use apkforge::ForgeConfig;
//!
//! let config = ForgeConfig::default();
//! config.validate().expect("Invalid configuration");
//! println!("{}", config);
//! ```

use crate::pipeline::PipelineConfig;
use crate::tools::{OfflineToolProbe, SystemToolProbe, ToolProbe};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_BIND: &str = "0.0.0.0:5000";
const DEFAULT_UPLOADS_DIR: &str = "uploads";
const DEFAULT_BUILDS_DIR: &str = "builds";
const DEFAULT_MAX_UPLOAD_MB: u64 = 500;
const DEFAULT_RUN_TOOLS: bool = true;
const DEFAULT_TOOL_TIMEOUT_CAP_SECS: u64 = 180;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Largest accepted upload limit (4 GiB).
const MAX_UPLOAD_MB_CEILING: u64 = 4096;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid bind address '{0}'")]
    InvalidBind(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

#[derive(Debug, Clone)]
pub struct ForgeConfig {
    /// Listen address, `host:port`
    pub bind: String,

    pub uploads_dir: PathBuf,

    pub builds_dir: PathBuf,

    /// Upload size limit in MiB
    pub max_upload_mb: u64,

    /// When false, every tool invocation reports "not installed"
    pub run_tools: bool,

    /// Caps every per-tool timeout, in seconds
    pub tool_timeout_cap_secs: u64,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ForgeConfig {
    /// Loads `APKFORGE_*` environment variables, falling back to defaults for
    /// anything missing or unparsable.
    fn default() -> Self {
        let bind = env::var("APKFORGE_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());

        let uploads_dir = env::var("APKFORGE_UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_UPLOADS_DIR));

        let builds_dir = env::var("APKFORGE_BUILDS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_BUILDS_DIR));

        let max_upload_mb = env::var("APKFORGE_MAX_UPLOAD_MB")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_MB);

        let run_tools = env::var("APKFORGE_RUN_TOOLS")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(DEFAULT_RUN_TOOLS);

        let tool_timeout_cap_secs = env::var("APKFORGE_TOOL_TIMEOUT_CAP")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TOOL_TIMEOUT_CAP_SECS);

        let log_level = env::var("APKFORGE_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            bind,
            uploads_dir,
            builds_dir,
            max_upload_mb,
            run_tools,
            tool_timeout_cap_secs,
            log_level,
        }
    }
}

impl ForgeConfig {
    /// Checks value ranges, the bind address and the log level.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;

        if self.max_upload_mb == 0 {
            return Err(ConfigError::ValidationFailed(
                "Upload limit must be at least 1 MB".to_string(),
            ));
        }
        if self.max_upload_mb > MAX_UPLOAD_MB_CEILING {
            return Err(ConfigError::ValidationFailed(format!(
                "Upload limit cannot exceed {} MB",
                MAX_UPLOAD_MB_CEILING
            )));
        }

        if self.tool_timeout_cap_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Tool timeout cap must be at least 1 second".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|_| ConfigError::InvalidBind(self.bind.clone()))
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb * 1024 * 1024
    }

    /// Real process runner, or the offline probe when tools are disabled.
    pub fn tool_probe(&self) -> Arc<dyn ToolProbe> {
        if self.run_tools {
            Arc::new(SystemToolProbe::with_timeout_cap(Duration::from_secs(
                self.tool_timeout_cap_secs,
            )))
        } else {
            Arc::new(OfflineToolProbe)
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::new().with_build_command(self.run_tools)
    }

    pub fn to_display_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("bind".to_string(), self.bind.clone());
        map.insert(
            "uploads_dir".to_string(),
            self.uploads_dir.display().to_string(),
        );
        map.insert("builds_dir".to_string(), self.builds_dir.display().to_string());
        map.insert("max_upload_mb".to_string(), self.max_upload_mb.to_string());
        map.insert("run_tools".to_string(), self.run_tools.to_string());
        map.insert(
            "tool_timeout_cap_secs".to_string(),
            self.tool_timeout_cap_secs.to_string(),
        );
        map.insert("log_level".to_string(), self.log_level.clone());
        map
    }
}

impl fmt::Display for ForgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Apkforge Configuration:")?;
        writeln!(f, "  Bind: {}", self.bind)?;
        writeln!(f, "  Uploads Dir: {}", self.uploads_dir.display())?;
        writeln!(f, "  Builds Dir: {}", self.builds_dir.display())?;
        writeln!(f, "  Max Upload: {} MB", self.max_upload_mb)?;
        writeln!(f, "  Run Tools: {}", self.run_tools)?;
        writeln!(f, "  Tool Timeout Cap: {}s", self.tool_timeout_cap_secs)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
