//! Analyzer configuration (TOML).
//!
//! Every key is optional and falls back to its default:
//!
//! ```toml
//! REPORT_SIZE = 1000
//! REPORT_DIR = "./reports"
//! LOG_DIR = "./log"
//! TS_DIR = "./ts"
//! ERRORS_PERCENT = 30
//! # LOG_FILEPATH = "./log_analyzer.log"
//! # REPORT_TEMPLATE = "./report.html"
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", deny_unknown_fields)]
pub struct Config {
    /// Maximum number of URLs in the report.
    #[serde(default = "default_report_size")]
    pub report_size: usize,
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_ts_dir")]
    pub ts_dir: PathBuf,
    /// Maximum tolerated share of unparsable lines, percent.
    #[serde(default = "default_errors_percent")]
    pub errors_percent: u8,
    /// Log to this file instead of stderr.
    #[serde(default)]
    pub log_filepath: Option<PathBuf>,
    #[serde(default)]
    pub report_template: Option<PathBuf>,
}

fn default_report_size() -> usize {
    1000
}
fn default_report_dir() -> PathBuf {
    PathBuf::from("./reports")
}
fn default_log_dir() -> PathBuf {
    PathBuf::from("./log")
}
fn default_ts_dir() -> PathBuf {
    PathBuf::from("./ts")
}
fn default_errors_percent() -> u8 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            report_size: default_report_size(),
            report_dir: default_report_dir(),
            log_dir: default_log_dir(),
            ts_dir: default_ts_dir(),
            errors_percent: default_errors_percent(),
            log_filepath: None,
            report_template: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("REPORT_SIZE must be positive")]
    ReportSize,
    #[error("ERRORS_PERCENT must be within 0..=100 (got {0})")]
    ErrorsPercent(u8),
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.report_size == 0 {
            return Err(ConfigError::ReportSize);
        }
        if self.errors_percent > 100 {
            return Err(ConfigError::ErrorsPercent(self.errors_percent));
        }
        Ok(())
    }

    /// Directories the run writes into or reads from.
    pub fn dirs(&self) -> [&Path; 3] {
        [
            self.log_dir.as_path(),
            self.report_dir.as_path(),
            self.ts_dir.as_path(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn load_str(content: &str) -> Result<Config, ConfigError> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, content).unwrap();
        Config::load(&path)
    }

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(load_str("").unwrap(), Config::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let cfg = load_str(
            r#"
REPORT_SIZE = 10
LOG_DIR = "/var/log/nginx"
LOG_FILEPATH = "/tmp/analyzer.log"
"#,
        )
        .unwrap();
        assert_eq!(
            cfg,
            Config {
                report_size: 10,
                log_dir: PathBuf::from("/var/log/nginx"),
                log_filepath: Some(PathBuf::from("/tmp/analyzer.log")),
                ..Config::default()
            }
        );
    }

    #[test]
    fn zero_report_size_is_rejected() {
        assert!(matches!(load_str("REPORT_SIZE = 0"), Err(ConfigError::ReportSize)));
    }

    #[test]
    fn errors_percent_out_of_range_is_rejected() {
        assert!(matches!(
            load_str("ERRORS_PERCENT = 101"),
            Err(ConfigError::ErrorsPercent(101))
        ));
        assert!(matches!(load_str("ERRORS_PERCENT = -1"), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(matches!(load_str("REPORT_SIZ = 5"), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
