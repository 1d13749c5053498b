//! Built-in status handlers.
//!
//! Status handlers render the body of a response that ended with a status but no body.

use axum::http::StatusCode;
use serde_json::json;
use std::collections::HashMap;

use crate::http::{Request, Response};
use crate::routing::middleware::{handler_fn, Handler};

/// Render a 500 response, exposing the recovered panic payload when there is one.
pub fn panic_status_handler(response: &mut Response, _request: &mut Request) {
    let message = response
        .error_marker()
        .map(str::to_string)
        .unwrap_or_else(|| reason(StatusCode::INTERNAL_SERVER_ERROR).to_string());
    response.json(StatusCode::INTERNAL_SERVER_ERROR, &json!({ "error": message }));
}

/// Render the JSON error envelope `{"error":"<reason phrase>"}` for the current status.
pub fn error_status_handler(response: &mut Response, _request: &mut Request) {
    let status = response
        .get_status()
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    response.json(status, &json!({ "error": reason(status) }));
}

fn reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown Status")
}

/// Status handlers of a root router: 500 renders panics, every other 4xx and 5xx code the
/// error envelope.
pub fn default_status_handlers() -> HashMap<StatusCode, Handler> {
    let panic_handler = handler_fn(panic_status_handler);
    let error_handler = handler_fn(error_status_handler);

    (400..=599u16)
        .filter_map(|code| StatusCode::from_u16(code).ok())
        .map(|status| {
            let handler = if status == StatusCode::INTERNAL_SERVER_ERROR {
                panic_handler.clone()
            } else {
                error_handler.clone()
            };
            (status, handler)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ResponseWriter;
    use axum::http::header::CONTENT_TYPE;

    fn request() -> Request {
        Request::new(
            axum::http::Request::builder()
                .uri("/uri")
                .body(axum::body::Bytes::new())
                .unwrap(),
        )
    }

    #[test]
    fn test_panic_status_handler() {
        let mut response = Response::new(ResponseWriter::new());
        response.set_error("random error".to_string());
        panic_status_handler(&mut response, &mut request());

        let writer = response.into_writer();
        assert_eq!(writer.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(writer.body(), b"{\"error\":\"random error\"}\n");

        let mut response = Response::new(ResponseWriter::new());
        panic_status_handler(&mut response, &mut request());
        assert_eq!(
            response.into_writer().body(),
            b"{\"error\":\"Internal Server Error\"}\n"
        );
    }

    #[test]
    fn test_error_status_handler() {
        let mut response = Response::new(ResponseWriter::new());
        response.status(StatusCode::NOT_FOUND);
        error_status_handler(&mut response, &mut request());

        let writer = response.into_writer();
        assert_eq!(writer.status(), StatusCode::NOT_FOUND);
        assert_eq!(writer.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(writer.body(), b"{\"error\":\"Not Found\"}\n");
    }

    #[test]
    fn test_default_map_covers_error_codes() {
        let handlers = default_status_handlers();
        assert_eq!(handlers.len(), 200);
        assert!(handlers.contains_key(&StatusCode::BAD_REQUEST));
        assert!(handlers.contains_key(&StatusCode::NETWORK_AUTHENTICATION_REQUIRED));
        assert!(!handlers.contains_key(&StatusCode::OK));
    }
}
