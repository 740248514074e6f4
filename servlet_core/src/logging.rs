//! Logging for servlets
//!
//! With the `logging` feature the `log_*!` macros at the crate root are the
//! ones from `liblogger`, so every servlet module loaded into a host writes
//! through one logger. Without it they expand to nothing.

#[cfg(feature = "logging")]
pub use liblogger::{LogConfig, LogLevel, Logger};

/// Environment variable naming an alternative configuration file.
pub const CONFIG_ENV: &str = "MODSERVER_CONFIG";

/// Configuration file read when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_FILE: &str = "modserver.toml";

/// Path of the configuration file this process should read.
pub fn config_path() -> String {
    config_path_from(std::env::var(CONFIG_ENV).ok())
}

fn config_path_from(env_value: Option<String>) -> String {
    match env_value {
        Some(path) if !path.trim().is_empty() => path,
        _ => DEFAULT_CONFIG_FILE.to_string(),
    }
}

/// Initialize the logger for a servlet module
///
/// Meant for the module's load hook. Reads the `[logging]` table of
/// [`config_path`]; when that fails the error goes to stderr and console
/// logging is used instead. The host may load several servlet modules into
/// one process; the first configuration installed wins.
///
/// # Example
///
/// ```
/// if let Err(e) = servlet_core::init_logger("servlet_echo") {
///     eprintln!("Failed to initialize logger: {}", e);
/// }
/// ```
#[cfg(feature = "logging")]
pub fn init_logger(servlet_name: &str) -> Result<(), String> {
    let path = config_path();
    if let Err(e) = Logger::init_with_config_file(&path) {
        eprintln!("[{}] Error initializing logger from {}: {}", servlet_name, path, e);
        Logger::init_with_config(LogConfig::default())?;
    }
    Logger::info(
        "servlet module loaded",
        Some(format!("servlet={}", servlet_name)),
        file!(),
        line!(),
        module_path!(),
    );
    Ok(())
}

// The arguments are type-checked but never evaluated.
#[cfg(not(feature = "logging"))]
mod no_op_macros {
    #[macro_export]
    macro_rules! log_debug {
        ($($arg:expr),* $(,)?) => {
            if false {
                let _ = ($(&$arg,)*);
            }
        };
    }

    #[macro_export]
    macro_rules! log_info {
        ($($arg:expr),* $(,)?) => {
            if false {
                let _ = ($(&$arg,)*);
            }
        };
    }

    #[macro_export]
    macro_rules! log_warn {
        ($($arg:expr),* $(,)?) => {
            if false {
                let _ = ($(&$arg,)*);
            }
        };
    }

    #[macro_export]
    macro_rules! log_error {
        ($($arg:expr),* $(,)?) => {
            if false {
                let _ = ($(&$arg,)*);
            }
        };
    }
}

#[cfg(not(feature = "logging"))]
pub fn init_logger(_servlet_name: &str) -> Result<(), String> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_defaults_to_modserver_toml() {
        if std::env::var(CONFIG_ENV).is_err() {
            assert_eq!(config_path(), DEFAULT_CONFIG_FILE);
        }
    }

    #[test]
    fn env_override_picks_the_config_file() {
        assert_eq!(config_path_from(Some("/etc/modserver/servlets.toml".to_string())), "/etc/modserver/servlets.toml");
        assert_eq!(config_path_from(Some("  ".to_string())), DEFAULT_CONFIG_FILE);
        assert_eq!(config_path_from(None), DEFAULT_CONFIG_FILE);
    }

    #[test]
    fn init_logger_never_fails_on_missing_config() {
        assert!(init_logger("logging_test").is_ok());
    }
}
