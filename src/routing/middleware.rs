//! Handlers, middleware and the built-in middleware stack.
//!
//! # Responsibilities
//! - Define the handler and middleware function types
//! - Compose middleware around a handler ([`MiddlewareHolder::apply`])
//! - Provide the middleware every root router starts with:
//!   recovery, language, request parsing
//!
//! # Design Decisions
//! - Middleware wraps a handler and returns a handler; composition happens per request
//! - Registration order is execution order: the first registered middleware runs first
//! - Panics are trapped with `catch_unwind`, so a failing handler yields a 500 instead of
//!   unwinding into the server

use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::config::ConfigHandle;
use crate::http::{Request, Response};

/// Terminal request handler.
pub type Handler = Arc<dyn Fn(&mut Response, &mut Request) + Send + Sync>;

/// Function wrapping a handler into another handler.
pub type Middleware = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// Box a closure as a [`Handler`].
pub fn handler_fn<F>(f: F) -> Handler
where
    F: Fn(&mut Response, &mut Request) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Box a closure as a [`Middleware`].
pub fn middleware_fn<F>(f: F) -> Middleware
where
    F: Fn(Handler) -> Handler + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Ordered list of middleware.
#[derive(Clone, Default)]
pub struct MiddlewareHolder {
    middleware: Vec<Middleware>,
}

impl MiddlewareHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, middleware: Middleware) {
        self.middleware.push(middleware);
    }

    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Wrap `handler` so that the middleware run in registration order before it.
    pub fn apply(&self, handler: Handler) -> Handler {
        self.middleware
            .iter()
            .rev()
            .fold(handler, |next, middleware| middleware(next))
    }
}

impl From<Vec<Middleware>> for MiddlewareHolder {
    fn from(middleware: Vec<Middleware>) -> Self {
        Self { middleware }
    }
}

impl fmt::Debug for MiddlewareHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareHolder")
            .field("len", &self.middleware.len())
            .finish()
    }
}

/// Readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Trap panics from the rest of the chain.
///
/// The payload becomes the response error marker and the status is set to 500, leaving the body
/// to the status handler.
pub fn recovery_middleware() -> Middleware {
    middleware_fn(|next: Handler| -> Handler {
        handler_fn(move |response, request| {
            let result = panic::catch_unwind(AssertUnwindSafe(|| next(response, request)));
            if let Err(payload) = result {
                let message = panic_message(payload.as_ref());
                tracing::error!(
                    method = %request.method(),
                    path = %request.uri().path(),
                    panic = %message,
                    "Handler panicked"
                );
                response.set_error(message);
                response.status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        })
    })
}

/// Language tags of an `Accept-Language` header, most preferred first.
///
/// Wildcards and tags with `q=0` are dropped; equal weights keep header order.
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let mut weighted: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.split(';');
            let tag = pieces.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let quality = pieces
                .filter_map(|param| param.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            (quality > 0.0).then(|| (tag.to_string(), quality))
        })
        .collect();

    weighted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    weighted.into_iter().map(|(tag, _)| tag).collect()
}

/// Set [`Request::lang`] from `Accept-Language`, or the configured default language.
pub fn language_middleware(config: ConfigHandle) -> Middleware {
    middleware_fn(move |next: Handler| -> Handler {
        let config = config.clone();
        handler_fn(move |response, request| {
            let preferred = request
                .header("accept-language")
                .and_then(|header| parse_accept_language(header).into_iter().next());
            let lang = match preferred {
                Some(lang) => lang,
                None => config.load().app.default_language.clone(),
            };
            request.set_lang(lang);
            next(response, request)
        })
    })
}

/// Parse the query string and form or JSON bodies into [`Request::data`].
///
/// A body that is not a JSON object stops the chain with 400.
pub fn parse_request_middleware() -> Middleware {
    middleware_fn(|next: Handler| -> Handler {
        handler_fn(move |response, request| {
            let mut data = HashMap::new();
            if let Some(query) = request.uri().query() {
                parse_form(query.as_bytes(), &mut data);
            }

            let content_type = request
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("")
                .to_ascii_lowercase();

            if !request.body().is_empty() {
                if content_type.starts_with("application/json") {
                    match serde_json::from_slice::<Value>(request.body()) {
                        Ok(Value::Object(fields)) => data.extend(fields),
                        Ok(_) => {
                            tracing::debug!(path = %request.uri().path(), "JSON body is not an object");
                            response.status(StatusCode::BAD_REQUEST);
                            return;
                        }
                        Err(e) => {
                            tracing::debug!(path = %request.uri().path(), error = %e, "Malformed JSON body");
                            response.status(StatusCode::BAD_REQUEST);
                            return;
                        }
                    }
                } else if content_type.starts_with("application/x-www-form-urlencoded") {
                    parse_form(request.body(), &mut data);
                }
            }

            request.data_mut().extend(data);
            next(response, request)
        })
    })
}

/// Decode `application/x-www-form-urlencoded` pairs. Repeated keys collect into an array.
fn parse_form(input: &[u8], data: &mut HashMap<String, Value>) {
    for (key, value) in url::form_urlencoded::parse(input) {
        let value = Value::String(value.into_owned());
        match data.get_mut(&*key) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                data.insert(key.into_owned(), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{RawRequest, ResponseWriter};
    use axum::body::Bytes;
    use std::sync::Mutex;

    fn ordered(result: &Arc<Mutex<String>>, value: &'static str) -> Middleware {
        let result = Arc::clone(result);
        middleware_fn(move |next: Handler| -> Handler {
            let result = Arc::clone(&result);
            handler_fn(move |response, request| {
                result.lock().unwrap().push_str(value);
                next(response, request)
            })
        })
    }

    fn raw(uri: &str) -> RawRequest {
        axum::http::Request::builder()
            .uri(uri)
            .body(Bytes::new())
            .unwrap()
    }

    fn run(handler: &Handler, raw: RawRequest) -> (Response, Request) {
        let mut response = Response::new(ResponseWriter::new());
        let mut request = Request::new(raw);
        handler(&mut response, &mut request);
        (response, request)
    }

    #[test]
    fn test_holder_applies_in_registration_order() {
        let result = Arc::new(Mutex::new(String::new()));
        let holder = MiddlewareHolder::from(vec![ordered(&result, "1"), ordered(&result, "2")]);

        let tail = Arc::clone(&result);
        let handler = holder.apply(handler_fn(move |_, _| tail.lock().unwrap().push('3')));
        run(&handler, raw("/"));

        assert_eq!(*result.lock().unwrap(), "123");
    }

    #[test]
    fn test_recovery_sets_error_marker() {
        let handler = recovery_middleware()(handler_fn(|_, _| panic!("random error")));
        let (response, _) = run(&handler, raw("/"));

        assert_eq!(response.get_status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(response.error_marker(), Some("random error"));
        assert!(response.is_empty());
    }

    #[test]
    fn test_accept_language_quality_order() {
        assert_eq!(
            parse_accept_language("fr-CH, fr;q=0.9, en;q=0.8, de;q=0.95, *;q=0.5"),
            vec!["fr-CH", "de", "fr", "en"]
        );
        assert_eq!(parse_accept_language("en;q=0, *"), Vec::<String>::new());
    }

    #[test]
    fn test_language_middleware_falls_back_to_default() {
        let config = ConfigHandle::default();
        let handler = language_middleware(config.clone())(handler_fn(|_, _| {}));

        let (_, request) = run(&handler, raw("/"));
        assert_eq!(request.lang(), config.load().app.default_language);

        let with_header = axum::http::Request::builder()
            .uri("/")
            .header("Accept-Language", "fr;q=0.5, es")
            .body(Bytes::new())
            .unwrap();
        let (_, request) = run(&handler, with_header);
        assert_eq!(request.lang(), "es");
    }

    #[test]
    fn test_parse_request_query_and_json() {
        let handler = parse_request_middleware()(handler_fn(|response, _| {
            response.string(StatusCode::OK, "ok")
        }));

        let raw = axum::http::Request::builder()
            .uri("/search?tag=a&tag=b&page=2")
            .header("Content-Type", "application/json")
            .body(Bytes::from_static(b"{\"name\":\"widget\",\"count\":3}"))
            .unwrap();
        let (response, request) = run(&handler, raw);

        assert!(!response.is_empty());
        assert_eq!(request.data()["tag"], serde_json::json!(["a", "b"]));
        assert_eq!(request.data()["page"], "2");
        assert_eq!(request.data()["name"], "widget");
        assert_eq!(request.data()["count"], 3);
    }

    #[test]
    fn test_parse_request_form_body() {
        let handler = parse_request_middleware()(handler_fn(|_, _| {}));
        let raw = axum::http::Request::builder()
            .method("POST")
            .uri("/form")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Bytes::from_static(b"name=blue+box&size=large"))
            .unwrap();
        let (_, request) = run(&handler, raw);

        assert_eq!(request.data()["name"], "blue box");
        assert!(request.has("size"));
    }

    #[test]
    fn test_parse_request_rejects_malformed_json() {
        let handler = parse_request_middleware()(handler_fn(|response, _| {
            response.string(StatusCode::OK, "should not run")
        }));

        for body in [&b"{not json"[..], &b"[1, 2]"[..]] {
            let raw = axum::http::Request::builder()
                .method("POST")
                .uri("/")
                .header("Content-Type", "application/json")
                .body(Bytes::copy_from_slice(body))
                .unwrap();
            let (response, _) = run(&handler, raw);

            assert_eq!(response.get_status(), Some(StatusCode::BAD_REQUEST));
            assert!(response.is_empty());
        }
    }
}
