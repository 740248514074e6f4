/*
 * Logger configuration
 *
 * Reads the [logging] table of modserver.toml. A bare table without the
 * [logging] header is accepted too. A missing file is not an error: the
 * servlet falls back to console logging at INFO.
 */

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Log severity levels, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

// Case-insensitive, and "warning" is accepted for Warn
impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(serde::de::Error::unknown_variant(
                &s,
                &["debug", "info", "warn", "warning", "error"],
            )),
        }
    }
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Where log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogType {
    /// Standard error. Standard output may belong to the host.
    Console,
    File,
}

impl<'de> Deserialize<'de> for LogType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_lowercase().as_str() {
            "console" => Ok(LogType::Console),
            "file" => Ok(LogType::File),
            _ => Err(serde::de::Error::unknown_variant(&s, &["console", "file"])),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    #[serde(rename = "type", default = "default_log_type")]
    pub log_type: LogType,

    /// Minimum level written
    #[serde(default = "default_threshold")]
    pub threshold: LogLevel,

    /// Log file name, joined onto `log_folder` when that is set
    #[serde(default)]
    pub file_path: Option<String>,

    #[serde(default)]
    pub log_folder: Option<String>,

    /// Size in MB at which the log file is rotated to `<file>.1`
    #[serde(default)]
    pub max_file_size_mb: Option<u64>,

    /// Flush the file after every line
    #[serde(default)]
    pub force_flush: bool,
}

fn default_log_type() -> LogType {
    LogType::Console
}

fn default_threshold() -> LogLevel {
    LogLevel::Info
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            log_type: LogType::Console,
            threshold: LogLevel::Info,
            file_path: None,
            log_folder: None,
            max_file_size_mb: None,
            force_flush: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigWrapper {
    logging: LogConfig,
}

impl LogConfig {
    /// Reads configuration from a TOML file, defaults if the file is missing.
    pub fn from_file<P: AsRef<Path>>(file_path: P) -> Result<Self, String> {
        let file_path = file_path.as_ref();
        match fs::read_to_string(file_path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) => {
                eprintln!(
                    "Warning: could not read config file '{}': {}. Using defaults.",
                    file_path.display(),
                    e
                );
                Ok(LogConfig::default())
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        match toml::from_str::<ConfigWrapper>(content) {
            Ok(wrapper) => Ok(wrapper.logging),
            // Fall back to a bare table, but report the [logging] error
            Err(e) => toml::from_str::<LogConfig>(content)
                .map_err(|_| format!("Failed to parse config file: {}", e)),
        }
    }

    /// Full path of the log file, or an error when `type = "file"` has no `file_path`.
    pub fn resolved_file_path(&self) -> Result<PathBuf, String> {
        let file_path = self
            .file_path
            .as_ref()
            .ok_or_else(|| "File path not specified in configuration".to_string())?;

        Ok(match &self.log_folder {
            Some(folder) => Path::new(folder).join(file_path),
            None => PathBuf::from(file_path),
        })
    }

    pub fn max_file_size_bytes(&self) -> Option<u64> {
        self.max_file_size_mb.map(|mb| mb.saturating_mul(1024 * 1024))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_logging_section() {
        let config = LogConfig::from_toml_str(
            r#"
            [logging]
            type = "File"
            threshold = "warning"
            file_path = "servlet.log"
            log_folder = "logs"
            max_file_size_mb = 5
            force_flush = true
            "#,
        )
        .unwrap();

        assert_eq!(config.log_type, LogType::File);
        assert_eq!(config.threshold, LogLevel::Warn);
        assert_eq!(config.resolved_file_path().unwrap(), Path::new("logs").join("servlet.log"));
        assert_eq!(config.max_file_size_bytes(), Some(5 * 1024 * 1024));
        assert!(config.force_flush);
    }

    #[test]
    fn accepts_bare_table_and_fills_defaults() {
        let config = LogConfig::from_toml_str("threshold = \"DEBUG\"\n").unwrap();
        assert_eq!(config.log_type, LogType::Console);
        assert_eq!(config.threshold, LogLevel::Debug);
        assert!(config.file_path.is_none());
    }

    #[test]
    fn rejects_unknown_level() {
        let err = LogConfig::from_toml_str("[logging]\nthreshold = \"loud\"\n").unwrap_err();
        assert!(err.starts_with("Failed to parse config file"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = LogConfig::from_file("definitely/not/here/modserver.toml").unwrap();
        assert_eq!(config, LogConfig::default());
    }

    #[test]
    fn file_type_without_path_is_reported() {
        let config = LogConfig {
            log_type: LogType::File,
            ..LogConfig::default()
        };
        assert!(config.resolved_file_path().is_err());
    }

    #[test]
    fn levels_are_ordered_by_severity() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warn < LogLevel::Error);
    }
}
