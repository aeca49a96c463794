//! Runner Settings (runtests.toml)
//!
//! The same schema is used for the project file and for the global
//! `~/.obspy/runtests.toml`; every field is optional so partial files merge.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings read from a runtests.toml file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RuntestsConfig {
    /// Report delivery settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportConfig>,

    /// Host environment settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<EnvironmentConfig>,
}

/// `[report]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// XML-RPC endpoint receiving the report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Timeout for the report call in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Send a report after every run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// `[environment]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Python interpreter used for dependency probing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python: Option<PathBuf>,
}

impl RuntestsConfig {
    /// Load settings from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate field values
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(report) = &self.report {
            if let Some(url) = &report.url {
                validate_url("report.url", url)?;
            }
            if report.timeout_secs == Some(0) {
                return Err(ConfigError::InvalidValue {
                    field: "report.timeout_secs".to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        if let Some(python) = self
            .environment
            .as_ref()
            .and_then(|env| env.python.as_ref())
        {
            if python.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "environment.python".to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Merge another config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &RuntestsConfig) {
        if let Some(other_report) = &other.report {
            let report = self.report.get_or_insert_with(ReportConfig::default);
            if other_report.url.is_some() {
                report.url = other_report.url.clone();
            }
            if other_report.timeout_secs.is_some() {
                report.timeout_secs = other_report.timeout_secs;
            }
            if other_report.enabled.is_some() {
                report.enabled = other_report.enabled;
            }
        }
        if let Some(other_env) = &other.environment {
            let env = self
                .environment
                .get_or_insert_with(EnvironmentConfig::default);
            if other_env.python.is_some() {
                env.python = other_env.python.clone();
            }
        }
    }
}

/// Reports are sent over plain HTTP(S) only
pub(crate) fn validate_url(field: &str, url: &str) -> ConfigResult<()> {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("expected an http:// or https:// URL, got '{}'", url),
        }),
    }
}
