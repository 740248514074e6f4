// servlet_api/src/lib.rs

use libc::{c_char, c_int, size_t};
use std::marker::{PhantomData, PhantomPinned};

/// The host's per-request servlet object (`servlet *` in `modserver.h`).
///
/// Only ever seen behind a pointer. The host allocates it, passes it to the
/// entry point and frees it after the entry point returns; Rust code must not
/// free it, move it or keep the pointer past that call.
#[repr(C)]
pub struct RawServlet {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

/// `const char* get_method(servlet *s)`
pub type GetMethodFn = unsafe extern "C" fn(s: *mut RawServlet) -> *const c_char;

/// `const char* get_arg(servlet *s, const char *name)`, NULL when absent.
pub type GetArgFn = unsafe extern "C" fn(s: *mut RawServlet, name: *const c_char) -> *const c_char;

/// `const char* get_header(servlet *s, const char *key)`, NULL when absent.
pub type GetHeaderFn = unsafe extern "C" fn(s: *mut RawServlet, key: *const c_char) -> *const c_char;

/// `void set_status(servlet *s, int status)`
pub type SetStatusFn = unsafe extern "C" fn(s: *mut RawServlet, status: c_int);

/// `void set_header(servlet *s, const char *key, const char *value)`
pub type SetHeaderFn =
    unsafe extern "C" fn(s: *mut RawServlet, key: *const c_char, value: *const c_char);

/// `void set_content_length(servlet *s, size_t length)`
///
/// Not every host exports this one.
pub type SetContentLengthFn = unsafe extern "C" fn(s: *mut RawServlet, length: size_t);

/// `void rwrite(servlet *s, const char *buffer, size_t length)`
pub type RwriteFn = unsafe extern "C" fn(s: *mut RawServlet, buffer: *const c_char, length: size_t);

/// `void rflush(servlet *s)`
pub type RflushFn = unsafe extern "C" fn(s: *mut RawServlet);

/// `int run(servlet *s)`, the function every servlet module exports.
pub type EntryPointFn = unsafe extern "C" fn(s: *mut RawServlet) -> c_int;

/// Entry point result the host treats as success. Every other value is
/// host-defined.
pub const RUN_SUCCESS: c_int = 0;

/// NUL-terminated symbol names, ready for `dlsym`-style lookups.
pub mod symbols {
    pub const RUN: &[u8] = b"run\0";
    pub const GET_METHOD: &[u8] = b"get_method\0";
    pub const GET_ARG: &[u8] = b"get_arg\0";
    pub const GET_HEADER: &[u8] = b"get_header\0";
    pub const SET_STATUS: &[u8] = b"set_status\0";
    pub const SET_HEADER: &[u8] = b"set_header\0";
    pub const SET_CONTENT_LENGTH: &[u8] = b"set_content_length\0";
    pub const RWRITE: &[u8] = b"rwrite\0";
    pub const RFLUSH: &[u8] = b"rflush\0";

    /// Strips the trailing NUL for display.
    pub fn display_name(symbol: &[u8]) -> &str {
        let name = symbol.strip_suffix(b"\0").unwrap_or(symbol);
        std::str::from_utf8(name).unwrap_or("<non-utf8 symbol>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_servlet_is_zero_sized() {
        assert_eq!(std::mem::size_of::<RawServlet>(), 0);
    }

    #[test]
    fn symbol_names_are_nul_terminated() {
        for symbol in [
            symbols::RUN,
            symbols::GET_METHOD,
            symbols::GET_ARG,
            symbols::GET_HEADER,
            symbols::SET_STATUS,
            symbols::SET_HEADER,
            symbols::SET_CONTENT_LENGTH,
            symbols::RWRITE,
            symbols::RFLUSH,
        ] {
            assert_eq!(symbol.last(), Some(&0));
            assert!(!symbol[..symbol.len() - 1].contains(&0));
        }
        assert_eq!(symbols::display_name(symbols::RWRITE), "rwrite");
    }
}
