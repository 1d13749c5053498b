//! Protocol guard.
//!
//! Requests that reach the application with a scheme other than the configured one are
//! permanently redirected to the same path and query on the configured scheme, host and port.

use axum::http::header::{self, HeaderValue};
use axum::http::{Method, StatusCode};

use crate::config::{AppConfig, Protocol};
use crate::http::request::{ConnectionScheme, RawRequest};
use crate::http::response::ResponseWriter;

/// Scheme the request was made with, when it can be told.
///
/// Absolute-form targets carry their own scheme; otherwise the server-provided
/// [`ConnectionScheme`] extension is used.
pub fn effective_scheme(request: &RawRequest) -> Option<&str> {
    request.uri().scheme_str().or_else(|| {
        request
            .extensions()
            .get::<ConnectionScheme>()
            .map(ConnectionScheme::as_str)
    })
}

/// Base URL of the application for `protocol`, e.g. `https://127.0.0.1:8443`.
///
/// The port is left out when it is the scheme default.
pub fn base_address(config: &AppConfig, protocol: Protocol) -> String {
    let server = &config.server;
    let port = match protocol {
        Protocol::Http => server.port,
        Protocol::Https => server.https_port,
    };
    let host = if server.host == "0.0.0.0" {
        "127.0.0.1"
    } else {
        server.host.as_str()
    };

    if port == protocol.default_port() {
        format!("{}://{}", protocol, host)
    } else {
        format!("{}://{}:{}", protocol, host, port)
    }
}

/// Build the redirect response when the request scheme differs from the configured protocol.
pub fn protocol_redirect(config: &AppConfig, request: &RawRequest) -> Option<ResponseWriter> {
    let protocol = config.server.protocol;
    let scheme = effective_scheme(request)?;
    if scheme.eq_ignore_ascii_case(protocol.as_str()) {
        return None;
    }

    let mut target = base_address(config, protocol);
    target.push_str(request.uri().path());
    if let Some(query) = request.uri().query() {
        target.push('?');
        target.push_str(query);
    }

    tracing::debug!(
        from = %scheme,
        to = %protocol,
        target = %target,
        "Redirecting to configured protocol"
    );

    let mut writer = ResponseWriter::new();
    let location = match HeaderValue::from_str(&target) {
        Ok(location) => location,
        Err(e) => {
            tracing::error!(target = %target, error = %e, "Invalid redirect target");
            writer.write_header(StatusCode::BAD_REQUEST);
            return Some(writer);
        }
    };
    writer.headers_mut().insert(header::LOCATION, location);

    let method = request.method();
    if method == Method::GET || method == Method::HEAD {
        writer.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
    }
    writer.write_header(StatusCode::PERMANENT_REDIRECT);
    if method == Method::GET {
        let body = format!(
            "<a href=\"{}\">{}</a>.\n\n",
            html_escape(&target),
            StatusCode::PERMANENT_REDIRECT
                .canonical_reason()
                .unwrap_or("Permanent Redirect")
        );
        writer.write(body.as_bytes());
    }
    Some(writer)
}

fn html_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
