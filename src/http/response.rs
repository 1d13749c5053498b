//! Response handling.
//!
//! # Responsibilities
//! - Buffer what handlers write ([`ResponseWriter`])
//! - Track whether a body was written and which status was requested ([`Response`])
//! - Carry the panic marker set by the recovery middleware
//! - Serve files with the right content headers
//!
//! # Design Decisions
//! - Two-phase status: `status()` records a code without writing, so status
//!   handlers can render the body later
//! - First header write wins, as on a real connection
//! - Bodies are buffered; the server converts the writer into a single response

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::StatusCode;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;

use crate::http::mime;

/// Buffered response writer handed to the router by the HTTP substrate.
#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Write the status line. Only the first call has an effect.
    pub fn write_header(&mut self, status: StatusCode) {
        match self.status {
            Some(written) => {
                tracing::warn!(
                    written = written.as_u16(),
                    ignored = status.as_u16(),
                    "Superfluous response header write"
                );
            }
            None => self.status = Some(status),
        }
    }

    /// Append body bytes, writing a 200 status line first if none was written.
    pub fn write(&mut self, data: &[u8]) {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(data);
    }

    /// Status written so far, if any.
    pub fn written_status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Status that would be sent: the written one, or 200.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Convert into a response for the HTTP server.
    pub fn into_response(self) -> axum::http::Response<Body> {
        let mut response = axum::http::Response::new(Body::from(self.body));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}

/// Per-request response handed to handlers and middleware.
#[derive(Debug)]
pub struct Response {
    writer: ResponseWriter,
    status: Option<StatusCode>,
    empty: bool,
    wrote_header: bool,
    err: Option<String>,
}

impl Response {
    pub fn new(writer: ResponseWriter) -> Self {
        let wrote_header = writer.written_status().is_some();
        Self {
            writer,
            status: None,
            empty: true,
            wrote_header,
            err: None,
        }
    }

    /// Set the response status without writing it.
    ///
    /// The most recent call wins until the header is written. An empty response with an error
    /// status is rendered by the matching status handler once the handler chain returns.
    pub fn status(&mut self, status: StatusCode) {
        if self.wrote_header {
            tracing::debug!(status = status.as_u16(), "Status ignored, header already written");
            return;
        }
        self.status = Some(status);
    }

    /// Status set by `status()` or written to the writer, if any.
    pub fn get_status(&self) -> Option<StatusCode> {
        self.status
    }

    /// True until any body byte is written.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn wrote_header(&self) -> bool {
        self.wrote_header
    }

    /// Panic payload recorded by the recovery middleware.
    pub fn error_marker(&self) -> Option<&str> {
        self.err.as_deref()
    }

    pub(crate) fn set_error(&mut self, err: String) {
        self.err = Some(err);
    }

    pub fn headers(&self) -> &HeaderMap {
        self.writer.headers()
    }

    pub fn header_mut(&mut self) -> &mut HeaderMap {
        self.writer.headers_mut()
    }

    /// Write the status line.
    pub fn write_header(&mut self, status: StatusCode) {
        if !self.wrote_header {
            self.status = Some(status);
            self.wrote_header = true;
        }
        self.writer.write_header(status);
    }

    /// Write body bytes. The status set earlier (or 200) is written first.
    pub fn write(&mut self, data: &[u8]) {
        if !self.wrote_header {
            self.write_header(self.status.unwrap_or(StatusCode::OK));
        }
        self.empty = false;
        self.writer.write(data);
    }

    /// Write a plain string body with the given status.
    pub fn string(&mut self, status: StatusCode, body: impl AsRef<str>) {
        self.write_header(status);
        self.write(body.as_ref().as_bytes());
    }

    /// Write a JSON body with the given status. The document is followed by a newline.
    pub fn json<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) {
        match serde_json::to_vec(value) {
            Ok(mut body) => {
                body.push(b'\n');
                self.header_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                self.write_header(status);
                self.write(&body);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize JSON response");
                self.status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
    }

    /// Send a temporary redirect to `url`.
    pub fn redirect(&mut self, url: &str) {
        self.redirect_with(StatusCode::TEMPORARY_REDIRECT, url);
    }

    pub(crate) fn redirect_with(&mut self, status: StatusCode, url: &str) {
        match HeaderValue::from_str(url) {
            Ok(location) => {
                self.header_mut().insert(header::LOCATION, location);
                self.write_header(status);
            }
            Err(e) => {
                tracing::error!(url = %url, error = %e, "Invalid redirect location");
                self.status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
    }

    /// Serve a file inline.
    ///
    /// A missing file sets 404 without writing, so the status handler renders the body.
    pub fn file(&mut self, path: &Path) {
        self.write_file(path, HeaderValue::from_static("inline"));
    }

    /// Serve a file as an attachment named `file_name`.
    pub fn download(&mut self, path: &Path, file_name: &str) {
        let disposition = format!("attachment; filename=\"{}\"", file_name.replace('"', "\\\""));
        match HeaderValue::from_str(&disposition) {
            Ok(value) => self.write_file(path, value),
            Err(e) => {
                tracing::error!(file_name = %file_name, error = %e, "Invalid download file name");
                self.status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
    }

    fn write_file(&mut self, path: &Path, disposition: HeaderValue) {
        if !path.is_file() {
            self.status(StatusCode::NOT_FOUND);
            return;
        }

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                let status = if e.kind() == io::ErrorKind::NotFound {
                    StatusCode::NOT_FOUND
                } else {
                    tracing::error!(path = ?path, error = %e, "Failed to read file");
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                self.status(status);
                return;
            }
        };

        let headers = self.header_mut();
        headers.insert(header::CONTENT_DISPOSITION, disposition);
        if !headers.contains_key(header::CONTENT_TYPE) {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(mime::detect(path, &bytes)),
            );
        }
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));

        self.write_header(StatusCode::OK);
        self.write(&bytes);
    }

    /// Write the pending status if nothing was written yet.
    pub(crate) fn flush_header(&mut self) {
        if !self.wrote_header {
            self.write_header(self.status.unwrap_or(StatusCode::OK));
        }
    }

    pub fn writer(&self) -> &ResponseWriter {
        &self.writer
    }

    pub fn into_writer(self) -> ResponseWriter {
        self.writer
    }
}
