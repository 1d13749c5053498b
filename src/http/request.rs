//! Request wrapper handed to handlers.
//!
//! # Responsibilities
//! - Expose the raw request (method, URI, headers, collected body)
//! - Carry the route parameters extracted by the router
//! - Carry values computed by the built-in middleware (language, parsed data)
//! - Expose the CORS options of the dispatching router
//!
//! # Design Decisions
//! - The body is collected before dispatch, so handlers are plain synchronous functions
//! - Parameters are owned strings; the router builds them once per request

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, Uri};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::routing::Route;
use crate::security::cors::CorsOptions;

/// Request as received from the HTTP substrate, with its body already collected.
pub type RawRequest = axum::http::Request<Bytes>;

/// Scheme of the connection a request arrived on.
///
/// Inserted into the request extensions by the HTTP server; origin-form request targets carry no
/// scheme of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionScheme {
    Http,
    Https,
}

impl ConnectionScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionScheme::Http => "http",
            ConnectionScheme::Https => "https",
        }
    }
}

/// Per-request view handed to handlers and middleware.
#[derive(Debug)]
pub struct Request {
    raw: RawRequest,
    params: HashMap<String, String>,
    data: HashMap<String, Value>,
    lang: String,
    route: Option<Arc<Route>>,
    cors_options: Option<Arc<CorsOptions>>,
}

impl Request {
    pub fn new(raw: RawRequest) -> Self {
        Self {
            raw,
            params: HashMap::new(),
            data: HashMap::new(),
            lang: String::new(),
            route: None,
            cors_options: None,
        }
    }

    /// Replace the route parameters.
    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn method(&self) -> &Method {
        self.raw.method()
    }

    pub fn uri(&self) -> &Uri {
        self.raw.uri()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.raw.headers()
    }

    /// Header value as a string, if present and valid ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.raw.headers().get(name).and_then(|value| value.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        self.raw.body()
    }

    pub fn raw(&self) -> &RawRequest {
        &self.raw
    }

    /// Route parameters captured by the matched pattern.
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Query and body values parsed by the request-shape middleware.
    pub fn data(&self) -> &HashMap<String, Value> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut HashMap<String, Value> {
        &mut self.data
    }

    /// Whether the parsed data contains `key`.
    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Preferred language, set by the language middleware.
    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn set_lang(&mut self, lang: impl Into<String>) {
        self.lang = lang.into();
    }

    /// The route being served.
    pub fn route(&self) -> Option<&Arc<Route>> {
        self.route.as_ref()
    }

    /// CORS options of the dispatching router, if CORS is enabled.
    pub fn cors_options(&self) -> Option<&CorsOptions> {
        self.cors_options.as_deref()
    }

    pub(crate) fn set_route(&mut self, route: Arc<Route>) {
        self.route = Some(route);
    }

    pub(crate) fn set_cors_options(&mut self, options: Option<Arc<CorsOptions>>) {
        self.cors_options = options;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_and_headers() {
        let raw = axum::http::Request::builder()
            .uri("/product/5")
            .header("X-Trace", "abc")
            .body(Bytes::new())
            .unwrap();
        let params = HashMap::from([("id".to_string(), "5".to_string())]);
        let request = Request::new(raw).with_params(params);

        assert_eq!(request.param("id"), Some("5"));
        assert_eq!(request.param("missing"), None);
        assert_eq!(request.header("x-trace"), Some("abc"));
        assert_eq!(request.method(), Method::GET);
        assert!(request.route().is_none());
    }
}
