//! Logging setup and small formatting helpers

pub mod format;
pub mod logging;

pub use format::format_file_size;
pub use logging::{init_default, init_from_env, init_logging, LoggingConfig};
