//! Structured logging setup
//!
//! Wraps `tracing-subscriber` with an env filter and either pretty console
//! or JSON output. Initialization happens at most once per process;
//! later calls are ignored.
//!
//! # Environment
//!
//! - `APKFORGE_LOG_LEVEL`: trace, debug, info, warn or error (default info)
//! - `APKFORGE_LOG_JSON`: emit JSON lines when `true`
//! - `RUST_LOG`: standard directives, takes precedence over the defaults
//!
//! # Example
//!
//! ```no_run
//! use apkforge::util::logging;
//!
//! logging::init_from_env();
//! tracing::info!(project_id = 1, "Analysis started");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Crates whose chatter is capped at `warn` unless `RUST_LOG` says otherwise.
const NOISY_CRATES: &[&str] = &["h2", "hyper", "tower_http::trace::on_request"];

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: Level,
    pub use_json: bool,
    pub include_target: bool,
    pub include_location: bool,
    pub include_thread_ids: bool,
    /// Write to stderr instead of stdout. The CLI keeps stdout for results.
    pub use_stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
            use_stderr: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// JSON output with file, line and thread metadata.
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
            include_thread_ids: true,
            use_stderr: false,
        }
    }

    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            ..Default::default()
        }
    }

    pub fn to_stderr(mut self) -> Self {
        self.use_stderr = true;
        self
    }
}

/// Parses a level name case-insensitively, falling back to INFO.
///
/// ```
/// use apkforge::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("DEBUG"), Level::DEBUG);
/// assert_eq!(parse_level("nonsense"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn build_filter(level: Level) -> EnvFilter {
    if env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }

    let mut filter = EnvFilter::new(format!("apkforge={},tower_http={}", level, level));
    for noisy in NOISY_CRATES {
        if let Ok(directive) = format!("{}=warn", noisy).parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let writer = if config.use_stderr {
            BoxMakeWriter::new(std::io::stderr)
        } else {
            BoxMakeWriter::new(std::io::stdout)
        };
        let layer = fmt::layer()
            .with_writer(writer)
            .with_target(config.include_target)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_thread_ids(config.include_thread_ids)
            .with_thread_names(config.include_thread_ids);

        let registry = tracing_subscriber::registry().with(build_filter(config.level));
        if config.use_json {
            registry.with(layer.json()).init();
        } else {
            registry.with(layer).init();
        }
    });
}

pub fn init_default() {
    init_logging(LoggingConfig::default());
}

/// Reads `APKFORGE_LOG_LEVEL` and `APKFORGE_LOG_JSON`.
pub fn init_from_env() {
    init_logging(config_from_env());
}

pub fn config_from_env() -> LoggingConfig {
    let level_str = env::var("APKFORGE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let use_json = env::var("APKFORGE_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    LoggingConfig {
        level: parse_level(&level_str),
        use_json,
        ..Default::default()
    }
}
