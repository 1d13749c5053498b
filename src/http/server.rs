//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum application that feeds every request to the router tree
//! - Wire up middleware layers (tracing, request ID, timeout)
//! - Collect request bodies within the configured limit
//! - Serve until the shutdown signal fires
//!
//! # Design Decisions
//! - Routing happens in the router tree, not in Axum: a single fallback handler
//! - Router handlers are synchronous, so dispatch runs on the blocking pool
//! - Body limit and timeout are read once, when the server is built

use axum::{
    extract::{Request, State},
    http::{HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::request::{ConnectionScheme, RawRequest};
use crate::observability::metrics;
use crate::routing::Router;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        uuid::Uuid::new_v4()
            .to_string()
            .parse()
            .ok()
            .map(RequestId::new)
    }
}

#[derive(Clone)]
struct AppState {
    router: Router,
    max_body_size: usize,
}

/// HTTP server serving a router tree.
pub struct HttpServer {
    app: axum::Router,
}

impl HttpServer {
    /// Build the server for `router`, using the router's current configuration.
    pub fn new(router: Router) -> Self {
        let config = router.config().load();
        let state = AppState {
            router,
            max_body_size: config.server.max_body_size,
        };
        let app = Self::build_app(&config.server, state);
        Self { app }
    }

    /// Build the Axum application with all middleware layers.
    #[allow(deprecated)]
    fn build_app(config: &ServerConfig, state: AppState) -> axum::Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);
        axum::Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(request_id.clone(), UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(request_id))
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.request_timeout_secs,
                    ))),
            )
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The Axum application, for embedding in another server.
    pub fn into_app(self) -> axum::Router {
        self.app
    }
}

/// Collect the body, then hand the request to the router tree.
async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let (mut parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(
                method = %method,
                path = %parts.uri.path(),
                limit = state.max_body_size,
                error = %e,
                "Request body rejected"
            );
            metrics::record_request(method.as_str(), 413, start);
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    parts.extensions.insert(ConnectionScheme::Http);
    let raw = RawRequest::from_parts(parts, bytes);
    let router = state.router.clone();

    let response = match tokio::task::spawn_blocking(move || router.serve_http(raw)).await {
        Ok(writer) => writer.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Dispatch task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        let request = axum::http::Request::builder().body(()).unwrap();
        let mut maker = UuidRequestId;
        let first = maker.make_request_id(&request).unwrap();
        let second = maker.make_request_id(&request).unwrap();

        assert_ne!(first.header_value(), second.header_value());
        assert_eq!(first.header_value().len(), 36);
    }
}
