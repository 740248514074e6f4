//! An in-memory modserver host for tests.
//!
//! The mock implements the host's C functions itself and reaches the servlet
//! through a [`HostTable`], so handlers under test go through the same
//! marshaling as in production. It behaves like the modserver C host: NULL
//! for absent arguments and headers, case-insensitive header names, and
//! returned strings that stay valid until the exchange is dropped. As in
//! modserver, the first write sends the status line and headers; status and
//! header calls after that are recorded but change nothing.

use libc::{c_char, c_int, size_t};
use servlet_api::RawServlet;
use std::ffi::{CStr, CString};
use std::slice;

use crate::entry::{self, IntoReturnCode};
use crate::host::HostTable;
use crate::servlet::Servlet;

/// The parsed request the mock host presents to a servlet.
#[derive(Debug, Clone)]
pub struct MockRequest {
    method: String,
    args: Vec<(String, String)>,
    headers: Vec<(String, String)>,
}

impl MockRequest {
    pub fn new(method: &str) -> Self {
        MockRequest {
            method: method.to_string(),
            args: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn get() -> Self {
        Self::new("GET")
    }

    pub fn arg(mut self, name: &str, value: &str) -> Self {
        self.args.push((name.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }
}

/// One host-visible effect, in the order the servlet caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Status(i32),
    Header(String, String),
    ContentLength(usize),
    Write(Vec<u8>),
    Flush,
}

/// Everything the servlet did to the response.
#[derive(Debug, Default, Clone)]
pub struct RecordedResponse {
    events: Vec<HostEvent>,
    status: Option<i32>,
    headers: Vec<(String, String)>,
    content_length: Option<usize>,
    body: Vec<u8>,
    flushed_len: usize,
    headers_sent_at: Option<usize>,
}

impl RecordedResponse {
    pub fn events(&self) -> &[HostEvent] {
        &self.events
    }

    pub fn status(&self) -> Option<i32> {
        self.status
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Length from `set_content_length`, or from a `Content-Length` header.
    pub fn declared_content_length(&self) -> Option<usize> {
        self.content_length
            .or_else(|| self.header("Content-Length").and_then(|v| v.parse().ok()))
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The part of the body the client has seen after the last flush.
    pub fn flushed_body(&self) -> &[u8] {
        &self.body[..self.flushed_len]
    }

    pub fn headers_sent(&self) -> bool {
        self.headers_sent_at.is_some()
    }

    /// Status, header and length calls made after the headers went out.
    pub fn late_header_changes(&self) -> Vec<&HostEvent> {
        let sent_at = match self.headers_sent_at {
            Some(index) => index,
            None => return Vec::new(),
        };
        self.events[sent_at..]
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    HostEvent::Status(_) | HostEvent::Header(..) | HostEvent::ContentLength(_)
                )
            })
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, HostEvent::Write(_))).count()
    }

    pub fn flush_count(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, HostEvent::Flush)).count()
    }
}

/// A request/response exchange served by the mock host.
#[derive(Debug)]
pub struct MockExchange {
    request: MockRequest,
    response: RecordedResponse,
    retained: Vec<CString>,
    host: HostTable,
}

impl MockExchange {
    pub fn new(request: MockRequest) -> Self {
        MockExchange {
            request,
            response: RecordedResponse::default(),
            retained: Vec::new(),
            host: Self::host_table(),
        }
    }

    /// The mock's host functions.
    pub fn host_table() -> HostTable {
        HostTable {
            get_method: mock_get_method,
            get_arg: mock_get_arg,
            get_header: mock_get_header,
            set_status: mock_set_status,
            set_header: mock_set_header,
            set_content_length: Some(mock_set_content_length),
            rwrite: mock_rwrite,
            rflush: mock_rflush,
        }
    }

    /// Acts like a host that does not export `set_content_length`.
    pub fn without_content_length(mut self) -> Self {
        self.host.set_content_length = None;
        self
    }

    /// Calls `handler` the way the host calls a servlet's `run`.
    pub fn run<H, R>(&mut self, handler: H) -> c_int
    where
        H: for<'s> FnOnce(&mut Servlet<'s>) -> R,
        R: IntoReturnCode,
    {
        let host = self.host;
        let raw = self as *mut MockExchange as *mut RawServlet;
        // SAFETY: `raw` points at this exchange, which the mock functions in
        // `host` expect, and nothing else touches `self` until dispatch returns.
        unsafe { entry::dispatch_with("mock", raw, &host, handler) }
    }

    /// Calls an exported entry point directly with the mock's handle.
    ///
    /// # Safety
    ///
    /// `entry_point` must only use the host functions of this mock.
    pub unsafe fn run_entry(&mut self, entry_point: servlet_api::EntryPointFn) -> c_int {
        let raw = self as *mut MockExchange as *mut RawServlet;
        unsafe { entry_point(raw) }
    }

    pub fn response(&self) -> &RecordedResponse {
        &self.response
    }

    pub fn into_response(self) -> RecordedResponse {
        self.response
    }

    fn retain(&mut self, value: &str) -> *const c_char {
        let value = value.split('\0').next().unwrap_or_default();
        match CString::new(value) {
            Ok(owned) => {
                let ptr = owned.as_ptr();
                self.retained.push(owned);
                ptr
            }
            Err(_) => std::ptr::null(),
        }
    }
}

unsafe fn exchange<'a>(s: *mut RawServlet) -> &'a mut MockExchange {
    assert!(!s.is_null(), "mock host called with a null servlet");
    unsafe { &mut *(s as *mut MockExchange) }
}

unsafe fn read_str(ptr: *const c_char) -> String {
    assert!(!ptr.is_null(), "mock host received a null string");
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

unsafe extern "C" fn mock_get_method(s: *mut RawServlet) -> *const c_char {
    let ex = unsafe { exchange(s) };
    let method = ex.request.method.clone();
    ex.retain(&method)
}

unsafe extern "C" fn mock_get_arg(s: *mut RawServlet, name: *const c_char) -> *const c_char {
    let ex = unsafe { exchange(s) };
    let name = unsafe { read_str(name) };
    let found = ex
        .request
        .args
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| v.clone());
    match found {
        Some(value) => ex.retain(&value),
        None => std::ptr::null(),
    }
}

unsafe extern "C" fn mock_get_header(s: *mut RawServlet, key: *const c_char) -> *const c_char {
    let ex = unsafe { exchange(s) };
    let key = unsafe { read_str(key) };
    let found = ex
        .request
        .headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        .map(|(_, v)| v.clone());
    match found {
        Some(value) => ex.retain(&value),
        None => std::ptr::null(),
    }
}

unsafe extern "C" fn mock_set_status(s: *mut RawServlet, status: c_int) {
    let response = &mut unsafe { exchange(s) }.response;
    if !response.headers_sent() {
        response.status = Some(status);
    }
    response.events.push(HostEvent::Status(status));
}

unsafe extern "C" fn mock_set_header(s: *mut RawServlet, key: *const c_char, value: *const c_char) {
    let response = &mut unsafe { exchange(s) }.response;
    let key = unsafe { read_str(key) };
    let value = unsafe { read_str(value) };

    if !response.headers_sent() {
        match response.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&key)) {
            Some(existing) => existing.1 = value.clone(),
            None => response.headers.push((key.clone(), value.clone())),
        }
    }
    response.events.push(HostEvent::Header(key, value));
}

unsafe extern "C" fn mock_set_content_length(s: *mut RawServlet, length: size_t) {
    let response = &mut unsafe { exchange(s) }.response;
    if !response.headers_sent() {
        response.content_length = Some(length);
    }
    response.events.push(HostEvent::ContentLength(length));
}

unsafe extern "C" fn mock_rwrite(s: *mut RawServlet, buffer: *const c_char, length: size_t) {
    assert!(!buffer.is_null(), "mock host received a null write buffer");
    assert!(length > 0, "mock host received an empty write");
    let response = &mut unsafe { exchange(s) }.response;
    let bytes = unsafe { slice::from_raw_parts(buffer as *const u8, length) };
    if response.headers_sent_at.is_none() {
        response.headers_sent_at = Some(response.events.len());
    }
    response.body.extend_from_slice(bytes);
    response.events.push(HostEvent::Write(bytes.to_vec()));
}

unsafe extern "C" fn mock_rflush(s: *mut RawServlet) {
    let response = &mut unsafe { exchange(s) }.response;
    response.flushed_len = response.body.len();
    response.events.push(HostEvent::Flush);
}
