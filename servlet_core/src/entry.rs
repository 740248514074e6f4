//! The per-request call from the host into a servlet handler.
//!
//! [`declare_servlet!`](crate::declare_servlet) exports `run`, which lands in
//! [`dispatch`]. The handler gets a `&mut Servlet<'_>` scoped to this call;
//! whatever it returns goes back to the host as an integer the bridge never
//! interprets.

use libc::c_int;
use servlet_api::{RawServlet, RUN_SUCCESS};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::ptr::NonNull;
use std::time::Instant;

use crate::error::BridgeError;
use crate::host::HostTable;
use crate::servlet::Servlet;

/// The integer a servlet hands back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReturnCode(c_int);

impl ReturnCode {
    pub const SUCCESS: ReturnCode = ReturnCode(RUN_SUCCESS);

    /// Returned when the bridge could not run the handler to completion:
    /// no host functions, a null handle, or a panic.
    pub const BRIDGE_FAILURE: ReturnCode = ReturnCode(-1);

    pub const fn new(code: c_int) -> Self {
        ReturnCode(code)
    }

    pub const fn code(self) -> c_int {
        self.0
    }

    pub fn is_success(self) -> bool {
        self.0 == RUN_SUCCESS
    }
}

/// What a handler may return.
pub trait IntoReturnCode {
    fn into_return_code(self) -> ReturnCode;
}

impl IntoReturnCode for () {
    fn into_return_code(self) -> ReturnCode {
        ReturnCode::SUCCESS
    }
}

impl IntoReturnCode for c_int {
    fn into_return_code(self) -> ReturnCode {
        ReturnCode(self)
    }
}

impl IntoReturnCode for ReturnCode {
    fn into_return_code(self) -> ReturnCode {
        self
    }
}

/// Runs `handler` for one request against the process's host functions.
///
/// # Safety
///
/// `raw` must be null or the handle the host passed to the current
/// entry-point call.
pub unsafe fn dispatch<H, R>(handler_name: &str, raw: *mut RawServlet, handler: H) -> c_int
where
    H: for<'s> FnOnce(&mut Servlet<'s>) -> R,
    R: IntoReturnCode,
{
    match HostTable::global() {
        Ok(host) => unsafe { dispatch_with(handler_name, raw, host, handler) },
        Err(e) => {
            crate::log_error!(
                &format!("servlet cannot reach its host: {}", e),
                Some(format!("servlet={}", handler_name))
            );
            ReturnCode::BRIDGE_FAILURE.code()
        }
    }
}

/// Runs `handler` for one request against an explicit set of host functions.
///
/// # Safety
///
/// `raw` must be null or a handle that `host`'s functions accept, valid for
/// the whole call.
pub unsafe fn dispatch_with<H, R>(
    handler_name: &str,
    raw: *mut RawServlet,
    host: &HostTable,
    handler: H,
) -> c_int
where
    H: for<'s> FnOnce(&mut Servlet<'s>) -> R,
    R: IntoReturnCode,
{
    match unsafe { invoke(handler_name, raw, host, handler) } {
        Ok(code) => code.code(),
        Err(e) => {
            crate::log_error!(&e.to_string(), Some(format!("servlet={}", handler_name)));
            ReturnCode::BRIDGE_FAILURE.code()
        }
    }
}

unsafe fn invoke<H, R>(
    handler_name: &str,
    raw: *mut RawServlet,
    host: &HostTable,
    handler: H,
) -> Result<ReturnCode, BridgeError>
where
    H: for<'s> FnOnce(&mut Servlet<'s>) -> R,
    R: IntoReturnCode,
{
    let raw = NonNull::new(raw).ok_or(BridgeError::NullHandle)?;
    let start_time = Instant::now();

    // Unwinding must not cross the extern "C" boundary back into the host.
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut servlet = unsafe { Servlet::from_raw(raw, host) };
        handler(&mut servlet).into_return_code()
    }));

    match outcome {
        Ok(code) => {
            crate::log_debug!(
                &format!("returned {} in {} us", code.code(), start_time.elapsed().as_micros()),
                Some(format!("servlet={}", handler_name))
            );
            Ok(code)
        }
        Err(payload) => Err(BridgeError::HandlerPanicked {
            handler: handler_name.to_string(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_means_success() {
        assert!(().into_return_code().is_success());
        assert_eq!(ReturnCode::SUCCESS.code(), 0);
    }

    #[test]
    fn integers_pass_through() {
        assert_eq!(404i32.into_return_code(), ReturnCode::new(404));
        assert_eq!((-7i32).into_return_code().code(), -7);
        assert!(!ReturnCode::BRIDGE_FAILURE.is_success());
    }

    #[test]
    fn panic_payloads_are_rendered() {
        let caught = panic::catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "static message");

        let caught = panic::catch_unwind(|| panic!("formatted {}", 42)).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "formatted 42");

        let caught = panic::catch_unwind(|| std::panic::panic_any(7u8)).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "Unknown panic");
    }
}
