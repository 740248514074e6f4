//! Copies between Rust strings and the host's C strings.
//!
//! Nothing here owns memory past the call it prepares: [`NativeString`] lives
//! on the caller's stack for one host call, and strings the host returns are
//! copied out immediately and never freed here.

use libc::{c_char, size_t};
use std::borrow::Cow;
use std::ffi::{CStr, CString};

const EMPTY: &CStr = c"";

/// A NUL-terminated copy of a Rust string, valid while this value is alive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeString(Cow<'static, CStr>);

impl NativeString {
    pub fn as_ptr(&self) -> *const c_char {
        self.0.as_ptr()
    }

    pub fn as_c_str(&self) -> &CStr {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.to_bytes().is_empty()
    }
}

/// Copies `value` into a NUL-terminated buffer for one host call.
///
/// The empty string maps to a static empty C string without touching the
/// (empty) input buffer. A host reads only up to the first NUL, so a value
/// with an interior NUL is cut there.
pub fn to_native(value: &str) -> NativeString {
    if value.is_empty() {
        return NativeString(Cow::Borrowed(EMPTY));
    }

    let bytes = value.as_bytes();
    let end = match bytes.iter().position(|&b| b == 0) {
        Some(pos) => {
            crate::log_warn!(&format!(
                "string passed to host contains NUL at byte {}; truncating {} bytes",
                pos,
                bytes.len() - pos
            ));
            pos
        }
        None => bytes.len(),
    };

    match CString::new(&bytes[..end]) {
        Ok(owned) if end > 0 => NativeString(Cow::Owned(owned)),
        _ => NativeString(Cow::Borrowed(EMPTY)),
    }
}

/// Copies a host string into a `String`. Null reads as empty; invalid UTF-8
/// is replaced.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that stays valid
/// for the duration of this call.
pub unsafe fn from_native(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// Pointer and explicit length of a byte buffer for the host's write call,
/// or `None` when there is nothing to write.
pub fn native_buffer(bytes: &[u8]) -> Option<(*const c_char, size_t)> {
    if bytes.is_empty() {
        return None;
    }
    Some((bytes.as_ptr() as *const c_char, bytes.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    fn empty_string_is_static_empty_c_string() {
        let native = to_native("");
        assert!(native.is_empty());
        assert_eq!(native.as_c_str().to_bytes_with_nul(), b"\0");
        assert!(matches!(native.0, Cow::Borrowed(_)));
    }

    #[test]
    fn copies_plain_text() {
        let native = to_native("User-Agent");
        assert_eq!(native.as_c_str().to_str().unwrap(), "User-Agent");
    }

    #[test]
    fn interior_nul_truncates() {
        assert_eq!(to_native("abc\0def").as_c_str().to_bytes(), b"abc");
        assert!(to_native("\0leading").is_empty());
    }

    #[test]
    fn null_pointer_reads_as_empty() {
        assert_eq!(unsafe { from_native(ptr::null()) }, "");
    }

    #[test]
    fn round_trips_through_native() {
        let native = to_native("text/plain; charset=UTF-8");
        assert_eq!(unsafe { from_native(native.as_ptr()) }, "text/plain; charset=UTF-8");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let raw = b"caf\xe9\0";
        let value = unsafe { from_native(raw.as_ptr() as *const c_char) };
        assert_eq!(value, "caf\u{fffd}");
    }

    #[test]
    fn empty_buffer_has_no_native_form() {
        assert!(native_buffer(b"").is_none());
        let (ptr, len) = native_buffer(b"abcd").unwrap();
        assert!(!ptr.is_null());
        assert_eq!(len, 4);
    }
}
