//! CLI configuration via environment variables
//!
//! Settings that concern the report server live in runtests.toml; these are
//! the switches that only change how this invocation behaves.

use std::env;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Always send a report (OBSPY_REPORT_TEST set to anything)
    pub force_report: bool,
    /// Disable colored output (OBSPY_NO_COLOR=1 or NO_COLOR=1)
    pub no_color: bool,
    /// Default to JSON summary output (OBSPY_OUTPUT=json)
    pub default_json: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            force_report: env::var_os("OBSPY_REPORT_TEST").is_some(),
            no_color: env::var_os("OBSPY_NO_COLOR").is_some() || env::var_os("NO_COLOR").is_some(),
            default_json: env::var("OBSPY_OUTPUT")
                .map(|v| v.to_lowercase() == "json")
                .unwrap_or(false),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
