extern crate servlet_core;

use serde::Serialize;
use servlet_core::{declare_servlet, log_debug, log_info, log_warn, Servlet};

#[derive(Serialize)]
struct Echo {
    arg: String,
    method: String,
    user_agent: String,
}

// Servlet initialization hook that runs when the host loads the module
#[ctor::ctor]
fn on_load() {
    if let Err(e) = servlet_core::init_logger("servlet_echo") {
        eprintln!("[servlet_echo] Failed to initialize logger: {}", e);
    }

    log_info!("Echo servlet loaded successfully");
}

/// Echoes the `arg` query argument, the request method and the `User-Agent`
/// header back to the client, one per line. `format=json` answers with a JSON
/// object instead.
pub fn handle(servlet: &mut Servlet<'_>) -> i32 {
    let echo = Echo {
        arg: servlet.get_arg("arg"),
        method: servlet.get_method(),
        user_agent: servlet.get_header("User-Agent"),
    };
    log_debug!(
        "echoing request",
        Some(format!("method={} arg={}", echo.method, echo.arg))
    );

    if servlet.get_arg("format") == "json" {
        return write_json(servlet, &echo);
    }

    servlet.set_status(200);
    servlet.set_header("Content-Type", "text/plain");
    servlet.rwrite(format!("{}\n{}\n{}\n", echo.arg, echo.method, echo.user_agent));
    servlet.rflush();
    0
}

fn write_json(servlet: &mut Servlet<'_>, echo: &Echo) -> i32 {
    match serde_json::to_vec(echo) {
        Ok(body) => {
            servlet.set_status(200);
            servlet.set_header("Content-Type", "application/json");
            servlet.set_content_length(body.len());
            servlet.rwrite(&body);
            servlet.rflush();
            0
        }
        Err(e) => {
            log_warn!(&format!("Failed to serialize echo: {}", e));
            servlet.set_status(500);
            servlet.set_header("Content-Type", "text/plain");
            servlet.rwrite("internal error\n");
            1
        }
    }
}

declare_servlet!(handle);

#[cfg(test)]
mod tests {
    use super::*;
    use servlet_core::testing::{HostEvent, MockExchange, MockRequest};

    #[test]
    fn echoes_argument_method_and_agent() {
        let request = MockRequest::get()
            .arg("arg", "5")
            .header("user-agent", "test-agent");
        let mut ex = MockExchange::new(request);

        assert_eq!(ex.run(handle), 0);

        let response = ex.into_response();
        assert_eq!(response.status(), Some(200));
        assert_eq!(response.header("Content-Type"), Some("text/plain"));
        assert_eq!(response.flushed_body(), b"5\nGET\ntest-agent\n");
        assert_eq!(response.events().last(), Some(&HostEvent::Flush));
    }

    #[test]
    fn missing_inputs_echo_as_blank_lines() {
        let mut ex = MockExchange::new(MockRequest::new("HEAD"));
        ex.run(handle);
        assert_eq!(ex.response().body_text(), "\nHEAD\n\n");
    }

    #[test]
    fn json_format_declares_its_length() {
        let request = MockRequest::get()
            .arg("arg", "a \"quoted\" value")
            .arg("format", "json")
            .header("User-Agent", "curl/8.0");
        let mut ex = MockExchange::new(request).without_content_length();

        assert_eq!(ex.run(handle), 0);

        let response = ex.response();
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(response.declared_content_length(), Some(response.body().len()));

        let parsed: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(parsed["arg"], "a \"quoted\" value");
        assert_eq!(parsed["method"], "GET");
        assert_eq!(parsed["user_agent"], "curl/8.0");
    }
}
