/*
 * Logger used by servlet modules loaded into a modserver host
 *
 * This crate exposes:
 * - Logger, the process-wide logger a servlet initializes once on load
 * - LogConfig, LogLevel and LogType, read from the [logging] table of modserver.toml
 * - log_debug!, log_info!, log_warn! and log_error!, which capture file, line and module
 *
 * Logging is synchronous. A servlet runs on whatever thread the host hands it,
 * so there is no background worker to start or shut down.
 */

mod config;
mod outputs;
mod logger;

pub use logger::Logger;
pub use config::{LogConfig, LogLevel, LogType};

#[macro_export]
macro_rules! log_debug {
    ($message:expr) => {
        $crate::Logger::debug($message, None, file!(), line!(), module_path!())
    };
    ($message:expr, $context:expr) => {
        $crate::Logger::debug($message, $context, file!(), line!(), module_path!())
    };
}

#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        $crate::Logger::info($message, None, file!(), line!(), module_path!())
    };
    ($message:expr, $context:expr) => {
        $crate::Logger::info($message, $context, file!(), line!(), module_path!())
    };
}

#[macro_export]
macro_rules! log_warn {
    ($message:expr) => {
        $crate::Logger::warn($message, None, file!(), line!(), module_path!())
    };
    ($message:expr, $context:expr) => {
        $crate::Logger::warn($message, $context, file!(), line!(), module_path!())
    };
}

#[macro_export]
macro_rules! log_error {
    ($message:expr) => {
        $crate::Logger::error($message, None, file!(), line!(), module_path!())
    };
    ($message:expr, $context:expr) => {
        $crate::Logger::error($message, $context, file!(), line!(), module_path!())
    };
}
