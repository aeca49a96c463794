//! ObsPy Test Runner Configuration
//!
//! Provides configuration management for `obspy-runtests`:
//! - Project configuration (runtests.toml)
//! - Global user configuration (~/.obspy/runtests.toml)
//! - Configuration precedence and merging
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.obspy/runtests.toml)
//! 2. Project config (./runtests.toml, searched upwards)
//! 3. Environment variables (OBSPY_*)
//! 4. CLI flags
//!
//! # Example
//!
//! ```no_run
//! use obspy_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("reports go to {}", config.report_url());
//! ```

pub mod loader;
pub mod settings;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Name of the project configuration file
pub const CONFIG_FILE_NAME: &str = "runtests.toml";

/// Report endpoint used when nothing else is configured
pub const DEFAULT_REPORT_URL: &str = "http://localhost:8000/";

/// Upper bound for the report call when nothing else is configured
pub const DEFAULT_REPORT_TIMEOUT_SECS: u64 = 10;

/// Interpreter queried for dependency and interpreter metadata
pub const DEFAULT_PYTHON: &str = "python3";

// Re-export main types
pub use loader::{Config, ConfigLoader};
pub use settings::{EnvironmentConfig, ReportConfig, RuntestsConfig};
