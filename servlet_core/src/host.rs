use once_cell::sync::OnceCell;
use servlet_api::{
    symbols, GetArgFn, GetHeaderFn, GetMethodFn, RflushFn, RwriteFn, SetContentLengthFn,
    SetHeaderFn, SetStatusFn,
};
use std::fmt;

#[cfg(unix)]
use libloading::os::unix::{Library, Symbol};
#[cfg(windows)]
use libloading::os::windows::{Library, Symbol};

use crate::error::BridgeError;

static GLOBAL_HOST: OnceCell<HostTable> = OnceCell::new();

/// The host functions a servlet calls, one pointer per function.
///
/// Resolved once per process from the symbols the host exports and never
/// changed afterwards, so every request on every thread shares it.
#[derive(Clone, Copy)]
pub struct HostTable {
    pub get_method: GetMethodFn,
    pub get_arg: GetArgFn,
    pub get_header: GetHeaderFn,
    pub set_status: SetStatusFn,
    pub set_header: SetHeaderFn,
    /// `None` when the host only understands a `Content-Length` header.
    pub set_content_length: Option<SetContentLengthFn>,
    pub rwrite: RwriteFn,
    pub rflush: RflushFn,
}

impl HostTable {
    /// Looks the host functions up in the running process image.
    pub fn resolve() -> Result<Self, BridgeError> {
        let image = process_image()?;

        // SAFETY: each symbol is read with the signature modserver.h declares for it.
        unsafe {
            Ok(HostTable {
                get_method: lookup(&image, symbols::GET_METHOD)?,
                get_arg: lookup(&image, symbols::GET_ARG)?,
                get_header: lookup(&image, symbols::GET_HEADER)?,
                set_status: lookup(&image, symbols::SET_STATUS)?,
                set_header: lookup(&image, symbols::SET_HEADER)?,
                set_content_length: lookup(&image, symbols::SET_CONTENT_LENGTH).ok(),
                rwrite: lookup(&image, symbols::RWRITE)?,
                rflush: lookup(&image, symbols::RFLUSH)?,
            })
        }
    }

    /// The process-wide table, resolved on first use.
    ///
    /// A failed resolution is not cached; the next request tries again.
    pub fn global() -> Result<&'static HostTable, BridgeError> {
        GLOBAL_HOST.get_or_try_init(|| {
            let table = Self::resolve()?;
            crate::log_info!(&format!("resolved modserver host functions: {:?}", table));
            Ok(table)
        })
    }

    pub fn has_content_length(&self) -> bool {
        self.set_content_length.is_some()
    }
}

impl fmt::Debug for HostTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostTable")
            .field("get_method", &(self.get_method as *const ()))
            .field("get_arg", &(self.get_arg as *const ()))
            .field("get_header", &(self.get_header as *const ()))
            .field("set_status", &(self.set_status as *const ()))
            .field("set_header", &(self.set_header as *const ()))
            .field("set_content_length", &self.set_content_length.map(|f| f as *const ()))
            .field("rwrite", &(self.rwrite as *const ()))
            .field("rflush", &(self.rflush as *const ()))
            .finish()
    }
}

#[cfg(unix)]
fn process_image() -> Result<Library, BridgeError> {
    Ok(Library::this())
}

#[cfg(windows)]
fn process_image() -> Result<Library, BridgeError> {
    Library::this().map_err(BridgeError::ProcessImage)
}

unsafe fn lookup<T: Copy>(image: &Library, symbol: &'static [u8]) -> Result<T, BridgeError> {
    let found: Symbol<T> = unsafe { image.get(symbol) }.map_err(|source| BridgeError::MissingSymbol {
        symbol: symbols::display_name(symbol),
        source,
    })?;
    Ok(*found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_is_not_a_host() {
        match HostTable::resolve() {
            Err(BridgeError::MissingSymbol { symbol, .. }) => assert_eq!(symbol, "get_method"),
            other => panic!("expected a missing host symbol, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn debug_reports_optional_content_length() {
        let table = crate::testing::MockExchange::host_table();
        let rendered = format!("{:?}", table);
        assert!(rendered.contains("set_content_length: Some("));
        assert!(table.has_content_length());
    }
}
