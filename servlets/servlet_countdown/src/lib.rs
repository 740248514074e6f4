extern crate servlet_core;

use servlet_core::{declare_servlet, log_debug, log_info, Servlet};
use std::io::Write;
use std::thread;
use std::time::Duration;

pub const DEFAULT_COUNT: u32 = 5;
pub const MAX_COUNT: u32 = 100;
pub const DEFAULT_DELAY_MS: u64 = 1000;
pub const MAX_DELAY_MS: u64 = 5000;

#[ctor::ctor]
fn on_load() {
    if let Err(e) = servlet_core::init_logger("servlet_countdown") {
        eprintln!("[servlet_countdown] Failed to initialize logger: {}", e);
    }

    log_info!("Countdown servlet loaded successfully");
}

/// Writes `count: 0` up to `count: N-1`, one line at a time, then `done`.
///
/// Each line is flushed before the pause so the client sees it immediately.
/// `count` and `delay_ms` come from the query string; missing or unparsable
/// values fall back to the defaults, and both are capped.
pub fn handle(servlet: &mut Servlet<'_>) -> i32 {
    let count = parse_arg(&servlet.get_arg("count"), DEFAULT_COUNT).min(MAX_COUNT);
    let delay = Duration::from_millis(
        parse_arg(&servlet.get_arg("delay_ms"), DEFAULT_DELAY_MS).min(MAX_DELAY_MS),
    );
    log_debug!(&format!("counting to {} with {:?} between lines", count, delay));

    servlet.set_header("Content-Type", "text/plain; charset=UTF-8");
    for n in 0..count {
        if writeln!(servlet, "count: {}", n).is_err() {
            return 1;
        }
        servlet.rflush();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
    servlet.rwrite("done\n");
    0
}

fn parse_arg<T: std::str::FromStr>(value: &str, default: T) -> T {
    value.trim().parse().unwrap_or(default)
}

declare_servlet!(handle);

#[cfg(test)]
mod tests {
    use super::*;
    use servlet_core::testing::{HostEvent, MockExchange, MockRequest};

    #[test]
    fn each_line_is_flushed_before_the_next() {
        let request = MockRequest::get().arg("count", "3").arg("delay_ms", "0");
        let mut ex = MockExchange::new(request);

        assert_eq!(ex.run(handle), 0);

        let response = ex.into_response();
        assert_eq!(response.body_text(), "count: 0\ncount: 1\ncount: 2\ndone\n");
        assert_eq!(response.flush_count(), 3);
        assert_eq!(response.flushed_body(), b"count: 0\ncount: 1\ncount: 2\n");

        let flushes: Vec<usize> = response
            .events()
            .iter()
            .enumerate()
            .filter(|(_, e)| **e == HostEvent::Flush)
            .map(|(i, _)| i)
            .collect();
        for i in flushes {
            assert!(matches!(response.events()[i - 1], HostEvent::Write(_)));
        }
    }

    #[test]
    fn zero_count_only_says_done() {
        let request = MockRequest::get().arg("count", "0").arg("delay_ms", "0");
        let mut ex = MockExchange::new(request);
        ex.run(handle);
        assert_eq!(ex.response().body_text(), "done\n");
        assert_eq!(ex.response().flush_count(), 0);
    }

    #[test]
    fn count_is_capped() {
        let request = MockRequest::get().arg("count", "100000").arg("delay_ms", "0");
        let mut ex = MockExchange::new(request);
        ex.run(handle);
        assert_eq!(ex.response().flush_count(), MAX_COUNT as usize);
    }

    #[test]
    fn bad_arguments_use_defaults() {
        assert_eq!(parse_arg("", DEFAULT_COUNT), DEFAULT_COUNT);
        assert_eq!(parse_arg("-3", DEFAULT_COUNT), DEFAULT_COUNT);
        assert_eq!(parse_arg(" 7 ", DEFAULT_COUNT), 7);
        assert_eq!(parse_arg("soon", DEFAULT_DELAY_MS), DEFAULT_DELAY_MS);
    }
}
