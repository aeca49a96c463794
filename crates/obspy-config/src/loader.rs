//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::settings::{validate_url, EnvironmentConfig, ReportConfig, RuntestsConfig};
use crate::{
    ConfigError, ConfigResult, CONFIG_FILE_NAME, DEFAULT_PYTHON, DEFAULT_REPORT_TIMEOUT_SECS,
    DEFAULT_REPORT_URL,
};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.obspy/runtests.toml) - lowest priority
/// 2. Project config (./runtests.toml) - overrides global
/// 3. Environment variables (OBSPY_*) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Effective settings after merging every source
    pub settings: RuntestsConfig,

    /// Project config file that was loaded, if any
    pub config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use an explicit global config path instead of ~/.obspy/runtests.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find runtests.toml, then merges it over
    /// the global config if one exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (config_path, project) = self.find_project_config(start_dir)?;
        self.finish(project, config_path)
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project = RuntestsConfig::load_from_file(config_path)?;
        self.finish(project, Some(config_path.to_path_buf()))
    }

    fn finish(
        &mut self,
        project: RuntestsConfig,
        config_path: Option<PathBuf>,
    ) -> ConfigResult<Config> {
        // No home directory means no global config; a broken one is an error
        let mut settings = match self.load_global_config() {
            Ok(global) => global,
            Err(ConfigError::HomeNotFound) => RuntestsConfig::default(),
            Err(e) => return Err(e),
        };
        settings.merge(&project);

        let settings = self.apply_env_overrides(settings)?;

        Ok(Config {
            settings,
            config_path,
        })
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (config_path, project_config); an absent file yields defaults
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, RuntestsConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.exists() {
                let project_config = RuntestsConfig::load_from_file(&config_path)?;
                return Ok((Some(config_path), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, RuntestsConfig::default())),
            }
        }
    }

    /// Load global configuration from ~/.obspy/runtests.toml
    fn load_global_config(&mut self) -> ConfigResult<RuntestsConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => {
                let path = Self::global_config_dir()?.join(CONFIG_FILE_NAME);
                self.global_config_path = Some(path.clone());
                path
            }
        };

        if !path.exists() {
            return Ok(RuntestsConfig::default());
        }

        RuntestsConfig::load_from_file(&path)
    }

    /// Apply environment variable overrides
    ///
    /// OBSPY_REPORT_URL, OBSPY_REPORT_TIMEOUT and OBSPY_PYTHON
    fn apply_env_overrides(&self, mut config: RuntestsConfig) -> ConfigResult<RuntestsConfig> {
        if let Ok(url) = env::var("OBSPY_REPORT_URL") {
            validate_url("OBSPY_REPORT_URL", &url)?;
            config
                .report
                .get_or_insert_with(ReportConfig::default)
                .url = Some(url);
        }

        if let Ok(timeout) = env::var("OBSPY_REPORT_TIMEOUT") {
            let secs = timeout
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    field: "OBSPY_REPORT_TIMEOUT".to_string(),
                    reason: format!("expected a positive number of seconds, got '{}'", timeout),
                })?;
            config
                .report
                .get_or_insert_with(ReportConfig::default)
                .timeout_secs = Some(secs);
        }

        if let Ok(python) = env::var("OBSPY_PYTHON") {
            if !python.is_empty() {
                config
                    .environment
                    .get_or_insert_with(EnvironmentConfig::default)
                    .python = Some(PathBuf::from(python));
            }
        }

        Ok(config)
    }

    /// Get the global configuration directory (~/.obspy)
    pub fn global_config_dir() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".obspy"))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Effective report endpoint
    pub fn report_url(&self) -> &str {
        self.report()
            .and_then(|r| r.url.as_deref())
            .unwrap_or(DEFAULT_REPORT_URL)
    }

    /// Effective report timeout
    pub fn report_timeout(&self) -> Duration {
        let secs = self
            .report()
            .and_then(|r| r.timeout_secs)
            .unwrap_or(DEFAULT_REPORT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    /// Whether the config asks for a report on every run
    pub fn report_enabled(&self) -> bool {
        self.report().and_then(|r| r.enabled).unwrap_or(false)
    }

    /// Interpreter used for dependency probing
    pub fn python(&self) -> &Path {
        self.settings
            .environment
            .as_ref()
            .and_then(|e| e.python.as_deref())
            .unwrap_or_else(|| Path::new(DEFAULT_PYTHON))
    }

    fn report(&self) -> Option<&ReportConfig> {
        self.settings.report.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn create_config_file(dir: &Path, content: &str) -> PathBuf {
        let config_path = dir.join(CONFIG_FILE_NAME);
        fs::write(&config_path, content).unwrap();
        config_path
    }

    fn isolated_loader(dir: &Path) -> ConfigLoader {
        ConfigLoader::new().with_global_config_path(dir.join("no-global.toml"))
    }

    #[test]
    #[serial]
    fn test_defaults_without_any_file() {
        let temp_dir = TempDir::new().unwrap();

        let config = isolated_loader(temp_dir.path())
            .load_from_directory(temp_dir.path())
            .unwrap();

        assert_eq!(config.report_url(), DEFAULT_REPORT_URL);
        assert_eq!(
            config.report_timeout(),
            Duration::from_secs(DEFAULT_REPORT_TIMEOUT_SECS)
        );
        assert!(!config.report_enabled());
        assert_eq!(config.python(), Path::new(DEFAULT_PYTHON));
        assert!(config.config_path.is_none());
    }

    #[test]
    #[serial]
    fn test_find_config_in_parent() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config_file(
            temp_dir.path(),
            r#"
[report]
url = "http://parent:8000/"
"#,
        );

        let sub_dir = temp_dir.path().join("subdir");
        fs::create_dir(&sub_dir).unwrap();

        let config = isolated_loader(temp_dir.path())
            .load_from_directory(&sub_dir)
            .unwrap();

        assert_eq!(config.report_url(), "http://parent:8000/");
        assert_eq!(config.config_path, Some(config_path));
    }

    #[test]
    #[serial]
    fn test_project_overrides_global() {
        let temp_dir = TempDir::new().unwrap();
        let global = temp_dir.path().join("global.toml");
        fs::write(
            &global,
            r#"
[report]
url = "http://global:8000/"
timeout_secs = 30
"#,
        )
        .unwrap();
        let project_dir = temp_dir.path().join("project");
        fs::create_dir(&project_dir).unwrap();
        create_config_file(
            &project_dir,
            r#"
[report]
url = "http://project:8000/"
"#,
        );

        let config = ConfigLoader::new()
            .with_global_config_path(&global)
            .load_from_directory(&project_dir)
            .unwrap();

        assert_eq!(config.report_url(), "http://project:8000/");
        assert_eq!(config.report_timeout(), Duration::from_secs(30));
    }

    #[test]
    #[serial]
    fn test_env_override_url_and_timeout() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[report]
url = "http://file:8000/"
timeout_secs = 2
"#,
        );

        env::set_var("OBSPY_REPORT_URL", "http://env:9000/");
        env::set_var("OBSPY_REPORT_TIMEOUT", "4");

        let config = isolated_loader(temp_dir.path())
            .load_from_directory(temp_dir.path())
            .unwrap();

        env::remove_var("OBSPY_REPORT_URL");
        env::remove_var("OBSPY_REPORT_TIMEOUT");

        assert_eq!(config.report_url(), "http://env:9000/");
        assert_eq!(config.report_timeout(), Duration::from_secs(4));
    }

    #[test]
    #[serial]
    fn test_env_override_invalid_timeout() {
        let temp_dir = TempDir::new().unwrap();

        env::set_var("OBSPY_REPORT_TIMEOUT", "soon");
        let result = isolated_loader(temp_dir.path()).load_from_directory(temp_dir.path());
        env::remove_var("OBSPY_REPORT_TIMEOUT");

        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    #[serial]
    fn test_load_from_specific_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");
        fs::write(
            &path,
            r#"
[environment]
python = "/opt/python/bin/python"
"#,
        )
        .unwrap();

        let config = isolated_loader(temp_dir.path())
            .load_from_file(&path)
            .unwrap();

        assert_eq!(config.python(), Path::new("/opt/python/bin/python"));
    }

    #[test]
    #[serial]
    fn test_invalid_global_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let global = temp_dir.path().join("global.toml");
        fs::write(&global, "[report]\nurl = \"ftp://nope\"\n").unwrap();

        let result = ConfigLoader::new()
            .with_global_config_path(&global)
            .load_from_directory(temp_dir.path());
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        fs::write(&global, "bogus = 1\n").unwrap();
        let result = ConfigLoader::new()
            .with_global_config_path(&global)
            .load_from_directory(temp_dir.path());
        assert!(matches!(result, Err(ConfigError::TomlParseError { .. })));
    }

    #[test]
    fn test_load_missing_specific_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = isolated_loader(temp_dir.path()).load_from_file(&temp_dir.path().join("nope.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }
}
