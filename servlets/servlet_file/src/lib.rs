extern crate servlet_core;

use servlet_core::{declare_servlet, log_info, log_warn, Servlet};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Environment variable naming the file this servlet serves.
pub const FILE_ENV: &str = "SERVLET_FILE_PATH";

/// Served when [`FILE_ENV`] is unset, relative to the host's working directory.
pub const DEFAULT_FILE: &str = "index.txt";

const CHUNK_SIZE: usize = 8192;

#[ctor::ctor]
fn on_load() {
    if let Err(e) = servlet_core::init_logger("servlet_file") {
        eprintln!("[servlet_file] Failed to initialize logger: {}", e);
    }

    log_info!("File servlet loaded successfully");
}

pub fn handle(servlet: &mut Servlet<'_>) -> i32 {
    let path = std::env::var(FILE_ENV).unwrap_or_else(|_| DEFAULT_FILE.to_string());
    serve_file(servlet, Path::new(&path))
}

/// Streams `path` as the response body with its length declared up front.
/// A file that cannot be opened is answered with `404`.
pub fn serve_file(servlet: &mut Servlet<'_>, path: &Path) -> i32 {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            log_warn!(
                &format!("Cannot open {}: {}", path.display(), e),
                Some(format!("method={}", servlet.get_method()))
            );
            servlet.set_status(404);
            servlet.set_header("Content-Type", "text/plain; charset=UTF-8");
            servlet.rwrite("file not found");
            return 0;
        }
    };

    match file.metadata().map(|m| declared_length(m.len())) {
        Ok(Some(length)) => servlet.set_content_length(length),
        Ok(None) => log_warn!(&format!("{} is too large to declare its length", path.display())),
        Err(e) => log_warn!(&format!("Cannot stat {}: {}", path.display(), e)),
    }
    servlet.set_header("Content-Type", "text/plain; charset=UTF-8");

    match copy_to_servlet(&mut file, servlet) {
        Ok(sent) => {
            log_info!(&format!("Served {} bytes from {}", sent, path.display()));
            0
        }
        Err(e) => {
            // Headers and part of the body may already be out; nothing to repair.
            log_warn!(&format!("Read of {} failed: {}", path.display(), e));
            1
        }
    }
}

// Lengths the target's usize cannot hold are left to chunked transfer.
fn declared_length(file_len: u64) -> Option<usize> {
    usize::try_from(file_len).ok()
}

fn copy_to_servlet<R: Read>(reader: &mut R, servlet: &mut Servlet<'_>) -> io::Result<usize> {
    let mut buf = [0u8; CHUNK_SIZE];
    let mut sent = 0;
    loop {
        let read = match reader.read(&mut buf) {
            Ok(0) => return Ok(sent),
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        servlet.rwrite(&buf[..read]);
        sent += read;
    }
}

declare_servlet!(handle);

#[cfg(test)]
mod tests {
    use super::*;
    use servlet_core::testing::{HostEvent, MockExchange, MockRequest};
    use std::fs;
    use std::path::PathBuf;

    fn temp_file(name: &str, contents: &[u8]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("servlet_file_test_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn streams_file_with_declared_length() {
        let contents: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        let path = temp_file("large.bin", &contents);

        let mut ex = MockExchange::new(MockRequest::get());
        assert_eq!(ex.run(|s| serve_file(s, &path)), 0);

        let response = ex.into_response();
        assert_eq!(response.events()[0], HostEvent::ContentLength(contents.len()));
        assert_eq!(response.body(), contents.as_slice());
        assert_eq!(response.write_count(), 3);
        assert_eq!(response.status(), None);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn empty_file_writes_nothing() {
        let path = temp_file("empty.txt", b"");

        let mut ex = MockExchange::new(MockRequest::get()).without_content_length();
        assert_eq!(ex.run(|s| serve_file(s, &path)), 0);

        assert_eq!(ex.response().declared_content_length(), Some(0));
        assert_eq!(ex.response().write_count(), 0);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn file_lengths_convert_when_they_fit() {
        assert_eq!(declared_length(0), Some(0));
        assert_eq!(declared_length(20_000), Some(20_000));
        assert_eq!(declared_length(usize::MAX as u64), Some(usize::MAX));
    }

    #[cfg(target_pointer_width = "32")]
    #[test]
    fn oversized_file_length_is_not_truncated() {
        assert_eq!(declared_length(1 << 32), None);
        assert_eq!(declared_length(u64::MAX), None);
    }

    #[test]
    fn missing_file_is_not_found() {
        let path = std::env::temp_dir().join("servlet_file_test_does_not_exist.txt");

        let mut ex = MockExchange::new(MockRequest::get());
        assert_eq!(ex.run(|s| serve_file(s, &path)), 0);

        assert_eq!(ex.response().status(), Some(404));
        assert_eq!(ex.response().body_text(), "file not found");
    }
}
