/*
 * Logger implementation
 *
 * One logger per process, created lazily through OnceCell. Several servlet
 * modules loaded into the same host each call Logger::init_with_config_file;
 * the first configuration wins and later calls are no-ops. Until a configuration is
 * installed, messages at INFO and above go to stderr.
 */

use chrono::Utc;
use once_cell::sync::OnceCell;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use crate::config::{LogConfig, LogLevel};
use crate::outputs::{create_log_output, LogOutput};

static LOGGER_INSTANCE: OnceCell<Mutex<LoggerInner>> = OnceCell::new();

struct LoggerInner {
    config: Option<LogConfig>,
    output: Option<Box<dyn LogOutput>>,
}

impl LoggerInner {
    fn new() -> Self {
        LoggerInner {
            config: None,
            output: None,
        }
    }

    fn init_with_config(&mut self, config: LogConfig) -> Result<(), String> {
        if self.config.is_some() {
            return Ok(());
        }
        self.output = Some(create_log_output(&config)?);
        self.config = Some(config);
        Ok(())
    }

    fn threshold(&self) -> LogLevel {
        self.config
            .as_ref()
            .map(|c| c.threshold)
            .unwrap_or(LogLevel::Info)
    }

    fn log(&mut self, level: LogLevel, message: &str, context: Option<&str>, file: &str, line: u32, module: &str) {
        if level < self.threshold() {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let formatted = format_log_message(&timestamp, level, message, context, file, line, module);

        match self.output {
            Some(ref mut output) => {
                if let Err(e) = output.write_log(&formatted) {
                    eprintln!("Failed to write log: {}", e);
                }
            }
            None => {
                let _ = writeln!(io::stderr(), "{}", formatted);
            }
        }
    }
}

fn format_log_message(timestamp: &str, level: LogLevel, message: &str,
                      context: Option<&str>, file: &str, line: u32, module: &str) -> String {
    let level_str = level.as_str();
    match context {
        Some(ctx) => format!("{} [{}] [{}:{}] [{}] {} | {}",
            timestamp, level_str, file, line, module, message, ctx),
        None => format!("{} [{}] [{}:{}] [{}] {}",
            timestamp, level_str, file, line, module, message),
    }
}

fn instance() -> &'static Mutex<LoggerInner> {
    LOGGER_INSTANCE.get_or_init(|| Mutex::new(LoggerInner::new()))
}

pub struct Logger;

impl Logger {
    pub fn init_with_config_file<P: AsRef<Path>>(config_path: P) -> Result<(), String> {
        let config = LogConfig::from_file(config_path)?;
        Self::init_with_config(config)
    }

    pub fn init_with_config(config: LogConfig) -> Result<(), String> {
        let mut guard = match instance().lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.init_with_config(config)
    }

    pub fn debug(message: &str, context: Option<String>, file: &'static str, line: u32, module: &'static str) {
        Self::log_with_metadata(LogLevel::Debug, message, context, file, line, module)
    }

    pub fn info(message: &str, context: Option<String>, file: &'static str, line: u32, module: &'static str) {
        Self::log_with_metadata(LogLevel::Info, message, context, file, line, module)
    }

    pub fn warn(message: &str, context: Option<String>, file: &'static str, line: u32, module: &'static str) {
        Self::log_with_metadata(LogLevel::Warn, message, context, file, line, module)
    }

    pub fn error(message: &str, context: Option<String>, file: &'static str, line: u32, module: &'static str) {
        Self::log_with_metadata(LogLevel::Error, message, context, file, line, module)
    }

    fn log_with_metadata(level: LogLevel, message: &str, context: Option<String>, file: &str, line: u32, module: &str) {
        let file_name = Path::new(file)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(file);

        match instance().lock() {
            Ok(mut logger) => logger.log(level, message, context.as_deref(), file_name, line, module),
            Err(_) => {
                let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
                let _ = writeln!(io::stderr(), "{} | MUTEX POISONED",
                    format_log_message(&timestamp, level, message, context.as_deref(), file_name, line, module));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_and_without_context() {
        let plain = format_log_message("T", LogLevel::Info, "hello", None, "entry.rs", 7, "servlet_core::entry");
        assert_eq!(plain, "T [INFO] [entry.rs:7] [servlet_core::entry] hello");

        let with_ctx = format_log_message("T", LogLevel::Error, "boom", Some("servlet=echo"), "a.rs", 1, "m");
        assert_eq!(with_ctx, "T [ERROR] [a.rs:1] [m] boom | servlet=echo");
    }

    #[test]
    fn first_configuration_wins() {
        let mut inner = LoggerInner::new();
        inner
            .init_with_config(LogConfig { threshold: LogLevel::Error, ..LogConfig::default() })
            .unwrap();
        inner
            .init_with_config(LogConfig { threshold: LogLevel::Debug, ..LogConfig::default() })
            .unwrap();
        assert_eq!(inner.threshold(), LogLevel::Error);
    }

    #[test]
    fn unconfigured_logger_defaults_to_info() {
        assert_eq!(LoggerInner::new().threshold(), LogLevel::Info);
    }
}
