//! Safe Rust side of the modserver servlet ABI.
//!
//! A servlet module exports `run(servlet *)`; the host calls it once per
//! request. [`declare_servlet!`] generates that export and hands the handler a
//! [`Servlet`], a borrowed capability for the single request being served.

pub mod entry;
pub mod error;
pub mod host;
pub mod logging;
pub mod marshal;
pub mod servlet;
mod servlet_macros;

#[cfg(any(test, feature = "testing"))]
pub mod testing;


pub use entry::{IntoReturnCode, ReturnCode};
pub use error::BridgeError;
pub use host::HostTable;
pub use logging::init_logger;
pub use servlet::Servlet;
pub use servlet_api::RawServlet;

#[cfg(feature = "logging")]
pub use liblogger::{log_debug, log_error, log_info, log_warn};
