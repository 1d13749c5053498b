//! Cross-origin resource sharing.
//!
//! # Responsibilities
//! - Hold the CORS policy of a router ([`CorsOptions`])
//! - Add the response headers every cross-origin request needs
//! - Answer preflight requests
//!
//! # Design Decisions
//! - Options are attached to the request by the dispatching router; the middleware reads them
//!   from there, so subrouters share their parent's policy
//! - An explicit origin list echoes the matching origin and adds `Vary: Origin`

use axum::http::header::{
    HeaderMap, HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_CREDENTIALS,
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE, ACCESS_CONTROL_REQUEST_HEADERS,
    ACCESS_CONTROL_REQUEST_METHOD, ORIGIN, VARY,
};
use axum::http::{Method, StatusCode};
use std::time::Duration;

use crate::routing::{handler_fn, middleware_fn, Handler, Middleware};

/// CORS policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsOptions {
    /// Allowed origins. `*` allows any origin.
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<Method>,
    /// Allowed request headers. Empty reflects what the preflight asks for.
    pub allowed_headers: Vec<String>,
    pub exposed_headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age: Option<Duration>,
    /// Pass preflight requests on to the route handler instead of answering 204.
    pub options_passthrough: bool,
}

impl Default for CorsOptions {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec![
                Method::HEAD,
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ],
            allowed_headers: ["Origin", "Accept", "Content-Type", "X-Requested-With", "Authorization"]
                .iter()
                .map(|header| header.to_string())
                .collect(),
            exposed_headers: Vec::new(),
            allow_credentials: false,
            max_age: Some(Duration::from_secs(12 * 60 * 60)),
            options_passthrough: false,
        }
    }
}

impl CorsOptions {
    fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }

    pub fn allows_origin(&self, origin: &str) -> bool {
        self.allows_any_origin()
            || self
                .allowed_origins
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(origin))
    }

    /// Headers sent on every response: allowed origin, credentials, exposed headers.
    pub fn configure_common(&self, request_headers: &HeaderMap, headers: &mut HeaderMap) {
        if self.allows_any_origin() {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        } else {
            headers.append(VARY, HeaderValue::from_static("Origin"));
            if let Some(origin) = request_headers.get(ORIGIN) {
                let allowed = origin
                    .to_str()
                    .map(|origin| self.allows_origin(origin))
                    .unwrap_or(false);
                if allowed {
                    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
                }
            }
        }

        if self.allow_credentials {
            headers.insert(
                ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        insert_list(headers, ACCESS_CONTROL_EXPOSE_HEADERS, &self.exposed_headers);
    }

    /// Headers answering a preflight request: methods, headers, max age.
    pub fn handle_preflight(&self, request_headers: &HeaderMap, headers: &mut HeaderMap) {
        let methods: Vec<&str> = self.allowed_methods.iter().map(Method::as_str).collect();
        insert_list(headers, ACCESS_CONTROL_ALLOW_METHODS, &methods);

        if self.allowed_headers.is_empty() {
            if let Some(requested) = request_headers.get(ACCESS_CONTROL_REQUEST_HEADERS) {
                headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
                headers.append(
                    VARY,
                    HeaderValue::from_static("Access-Control-Request-Headers"),
                );
            }
        } else {
            insert_list(headers, ACCESS_CONTROL_ALLOW_HEADERS, &self.allowed_headers);
        }

        if let Some(max_age) = self.max_age.filter(|age| !age.is_zero()) {
            headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from(max_age.as_secs()));
        }
    }
}

fn insert_list<S: AsRef<str>>(headers: &mut HeaderMap, name: HeaderName, values: &[S]) {
    if values.is_empty() {
        return;
    }
    let joined = values
        .iter()
        .map(|value| value.as_ref())
        .collect::<Vec<&str>>()
        .join(", ");
    match HeaderValue::from_str(&joined) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(e) => tracing::warn!(header = %name, error = %e, "Invalid CORS header value"),
    }
}

/// Apply the request's CORS options, answering preflight requests with 204.
///
/// Requests dispatched by a router without CORS options pass through untouched.
pub fn cors_middleware() -> Middleware {
    middleware_fn(|next: Handler| -> Handler {
        handler_fn(move |response, request| {
            let preflight = match request.cors_options() {
                None => None,
                Some(options) => {
                    options.configure_common(request.headers(), response.header_mut());
                    let is_preflight = request.method() == Method::OPTIONS
                        && request.headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD);
                    if is_preflight {
                        options.handle_preflight(request.headers(), response.header_mut());
                    }
                    Some((is_preflight, options.options_passthrough))
                }
            };

            match preflight {
                Some((true, false)) => response.write_header(StatusCode::NO_CONTENT),
                _ => next(response, request),
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preflight_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ORIGIN, HeaderValue::from_static("https://shop.example"));
        headers.insert(ACCESS_CONTROL_REQUEST_METHOD, HeaderValue::from_static("PUT"));
        headers.insert(
            ACCESS_CONTROL_REQUEST_HEADERS,
            HeaderValue::from_static("X-Custom"),
        );
        headers
    }

    #[test]
    fn test_default_allows_any_origin() {
        let options = CorsOptions::default();
        let mut headers = HeaderMap::new();
        options.configure_common(&preflight_headers(), &mut headers);

        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(!headers.contains_key(VARY));
        assert!(!headers.contains_key(ACCESS_CONTROL_ALLOW_CREDENTIALS));
    }

    #[test]
    fn test_explicit_origin_list() {
        let options = CorsOptions {
            allowed_origins: vec!["https://shop.example".to_string()],
            allow_credentials: true,
            exposed_headers: vec!["X-Total".to_string(), "X-Page".to_string()],
            ..CorsOptions::default()
        };
        let mut headers = HeaderMap::new();
        options.configure_common(&preflight_headers(), &mut headers);

        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://shop.example");
        assert_eq!(headers[VARY], "Origin");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[ACCESS_CONTROL_EXPOSE_HEADERS], "X-Total, X-Page");

        let mut request_headers = HeaderMap::new();
        request_headers.insert(ORIGIN, HeaderValue::from_static("https://evil.example"));
        let mut headers = HeaderMap::new();
        options.configure_common(&request_headers, &mut headers);
        assert!(!headers.contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[test]
    fn test_preflight_headers() {
        let options = CorsOptions::default();
        let mut headers = HeaderMap::new();
        options.handle_preflight(&preflight_headers(), &mut headers);

        assert_eq!(
            headers[ACCESS_CONTROL_ALLOW_METHODS],
            "HEAD, GET, POST, PUT, PATCH, DELETE"
        );
        assert_eq!(
            headers[ACCESS_CONTROL_ALLOW_HEADERS],
            "Origin, Accept, Content-Type, X-Requested-With, Authorization"
        );
        assert_eq!(headers[ACCESS_CONTROL_MAX_AGE], "43200");
    }

    #[test]
    fn test_preflight_reflects_requested_headers() {
        let options = CorsOptions {
            allowed_headers: Vec::new(),
            max_age: None,
            ..CorsOptions::default()
        };
        let mut headers = HeaderMap::new();
        options.handle_preflight(&preflight_headers(), &mut headers);

        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], "X-Custom");
        assert_eq!(headers[VARY], "Access-Control-Request-Headers");
        assert!(!headers.contains_key(ACCESS_CONTROL_MAX_AGE));
    }
}
