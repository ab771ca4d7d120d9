//! Run configuration for the quality evaluation.
//!
//! Two kinds of settings with different failure behavior: tunables with a
//! sensible default (missing file or missing key falls back, with a
//! diagnostic), and settings the run cannot proceed without (the quality
//! log path, when neither the config nor the command line provides one).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;
use wsal_core::ConfigError;

/// Checks expected per iteration for the recorded behavior schedule.
pub const DEFAULT_EXPECTED_CHECKS: usize = 54;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub logging: LoggingConfig,
    pub evaluation: EvaluationConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Destination file for the quality log. May instead come from the
    /// command line, which takes precedence.
    pub quality_log_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Number of quality checks one full iteration of the behavior schedule
    /// is expected to produce.
    pub expected_checks_per_iteration: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            expected_checks_per_iteration: DEFAULT_EXPECTED_CHECKS,
        }
    }
}

impl RunConfig {
    /// Parse a TOML config file. Unknown keys are tolerated; I/O and syntax
    /// problems are typed errors for the caller to decide on.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load `path` if given, falling back to defaults on any load failure.
    /// The fallback is logged so a typo in the path does not silently run
    /// with default settings.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config not usable, falling back to defaults");
                Self::default()
            }
        }
    }

    /// The quality log destination: command line wins over config file, and
    /// having neither is fatal because an unlogged evaluation is worthless.
    pub fn require_log_path(&self, cli_override: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
        cli_override
            .or_else(|| self.logging.quality_log_path.clone())
            .ok_or_else(|| ConfigError::MissingKey {
                key: "logging.quality_log_path".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_apply_without_a_config_file() {
        let config = RunConfig::load_or_default(None);
        assert_eq!(
            config.evaluation.expected_checks_per_iteration,
            DEFAULT_EXPECTED_CHECKS
        );
        assert!(config.logging.quality_log_path.is_none());
    }

    #[test]
    fn partial_config_keeps_defaults_for_missing_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nquality_log_path = \"/tmp/quality.log\"").unwrap();

        let config = RunConfig::load(file.path()).unwrap();
        assert_eq!(
            config.logging.quality_log_path,
            Some(PathBuf::from("/tmp/quality.log"))
        );
        assert_eq!(
            config.evaluation.expected_checks_per_iteration,
            DEFAULT_EXPECTED_CHECKS
        );
    }

    #[test]
    fn broken_config_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is not toml [[[").unwrap();

        let config = RunConfig::load_or_default(Some(file.path()));
        assert_eq!(
            config.evaluation.expected_checks_per_iteration,
            DEFAULT_EXPECTED_CHECKS
        );
    }

    #[test]
    fn log_path_resolution_prefers_the_command_line() {
        let mut config = RunConfig::default();
        config.logging.quality_log_path = Some(PathBuf::from("/var/log/from_config.log"));

        let resolved = config
            .require_log_path(Some(PathBuf::from("/var/log/from_cli.log")))
            .unwrap();
        assert_eq!(resolved, PathBuf::from("/var/log/from_cli.log"));

        let resolved = config.require_log_path(None).unwrap();
        assert_eq!(resolved, PathBuf::from("/var/log/from_config.log"));
    }

    #[test]
    fn missing_log_path_is_fatal() {
        let config = RunConfig::default();
        let err = config.require_log_path(None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { .. }));
    }
}
