//! Static file serving.
//!
//! A static route captures the requested path in a `resource` parameter; the handler resolves it
//! against a root directory, falling back to `index.html` for directories.

use axum::http::StatusCode;
use std::path::{Component, Path, PathBuf};

use crate::routing::middleware::{handler_fn, Handler};

/// Name of the route parameter holding the requested file.
pub const RESOURCE_PARAM: &str = "resource";

/// Join `resource` to `directory`.
///
/// One leading `/` is stripped from `resource`. When the result is a directory, `index.html`
/// inside it is returned instead.
pub fn clean_static_path(directory: &str, resource: &str) -> String {
    let file = resource.strip_prefix('/').unwrap_or(resource);
    let mut path = format!("{}/{}", directory, file);
    if Path::new(&path).is_dir() {
        if !path.ends_with('/') {
            path.push('/');
        }
        path.push_str("index.html");
    }
    path
}

/// Handler serving files from `directory`.
///
/// With `download`, files are sent as attachments named after the file. A missing file, or a
/// resource leaving the directory through `..`, sets 404 without writing a body.
pub fn static_handler(directory: impl Into<String>, download: bool) -> Handler {
    let directory = directory.into();
    handler_fn(move |response, request| {
        let resource = request.param(RESOURCE_PARAM).unwrap_or("");
        if Path::new(resource)
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            tracing::warn!(resource = %resource, "Rejected static path escaping its directory");
            response.status(StatusCode::NOT_FOUND);
            return;
        }

        let path = PathBuf::from(clean_static_path(&directory, resource));
        if download {
            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("download")
                .to_string();
            response.download(&path, &file_name);
        } else {
            response.file(&path);
        }
    })
}
