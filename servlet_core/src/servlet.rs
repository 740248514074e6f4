use servlet_api::RawServlet;
use std::fmt;
use std::io;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::host::HostTable;
use crate::marshal::{self, from_native, to_native};

/// One in-flight request/response exchange, borrowed from the host.
///
/// Handlers only ever receive `&mut Servlet<'_>` from the entry point and
/// cannot build one themselves. The lifetime ties it to that single call, and
/// the type is neither `Send` nor `Sync`, so it cannot be stored or handed to
/// another thread.
///
/// Reads never fail: anything the request does not carry comes back as an
/// empty string. Writes have no result; the host decides what happens on the
/// wire.
pub struct Servlet<'a> {
    raw: NonNull<RawServlet>,
    host: &'a HostTable,
    _exchange: PhantomData<&'a mut RawServlet>,
}

impl<'a> Servlet<'a> {
    /// # Safety
    ///
    /// `raw` must be the handle the host passed to the current entry-point
    /// call, and `host` must be the functions that handle belongs to.
    pub(crate) unsafe fn from_raw(raw: NonNull<RawServlet>, host: &'a HostTable) -> Self {
        Servlet {
            raw,
            host,
            _exchange: PhantomData,
        }
    }

    fn raw(&self) -> *mut RawServlet {
        self.raw.as_ptr()
    }

    /// The request method, e.g. `GET`.
    pub fn get_method(&self) -> String {
        unsafe { from_native((self.host.get_method)(self.raw())) }
    }

    /// Value of the query argument `name`; empty if absent or valueless.
    pub fn get_arg(&self, name: &str) -> String {
        if name.is_empty() {
            return String::new();
        }
        let c_name = to_native(name);
        unsafe { from_native((self.host.get_arg)(self.raw(), c_name.as_ptr())) }
    }

    /// Value of the request header `key`; empty if absent. Key matching is up
    /// to the host (modserver matches case-insensitively).
    pub fn get_header(&self, key: &str) -> String {
        if key.is_empty() {
            return String::new();
        }
        let c_key = to_native(key);
        unsafe { from_native((self.host.get_header)(self.raw(), c_key.as_ptr())) }
    }

    /// Sets the response status. The last call before the headers go out wins.
    pub fn set_status(&mut self, code: i32) {
        unsafe { (self.host.set_status)(self.raw(), code) }
    }

    /// Sets a response header, replacing an earlier value for the same key.
    /// An empty key is ignored.
    pub fn set_header(&mut self, key: &str, value: &str) {
        if key.is_empty() {
            crate::log_debug!("ignoring response header with an empty name");
            return;
        }
        let c_key = to_native(key);
        let c_value = to_native(value);
        unsafe { (self.host.set_header)(self.raw(), c_key.as_ptr(), c_value.as_ptr()) }
    }

    /// Declares the response body length up front. Optional.
    ///
    /// Hosts without a `set_content_length` export get a `Content-Length`
    /// header instead.
    pub fn set_content_length(&mut self, length: usize) {
        match self.host.set_content_length {
            Some(set_content_length) => unsafe { set_content_length(self.raw(), length) },
            None => self.set_header("Content-Length", &length.to_string()),
        }
    }

    /// Appends `buffer` to the response body. Empty buffers are not passed on.
    pub fn rwrite<B: AsRef<[u8]>>(&mut self, buffer: B) {
        if let Some((ptr, len)) = marshal::native_buffer(buffer.as_ref()) {
            unsafe { (self.host.rwrite)(self.raw(), ptr, len) }
        }
    }

    /// Sends everything written so far to the client now. Safe to call with
    /// nothing pending, and any number of times.
    pub fn rflush(&mut self) {
        unsafe { (self.host.rflush)(self.raw()) }
    }
}

/// `write!`/`writeln!` straight into the response body.
impl io::Write for Servlet<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.rwrite(buf);
        Ok(buf.len())
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.rwrite(buf);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.rflush();
        Ok(())
    }
}

impl fmt::Debug for Servlet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Servlet").field("raw", &self.raw).finish_non_exhaustive()
    }
}
