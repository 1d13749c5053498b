//! Shared utilities for integration tests.
#![allow(dead_code)]

use axum::body::Bytes;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use switchyard::http::{RawRequest, ResponseWriter};
use switchyard::routing::{handler_fn, middleware_fn, Handler, Middleware};
use switchyard::{HttpServer, Router, Shutdown};

/// Build a request with an empty body.
pub fn raw_request(method: &str, uri: &str) -> RawRequest {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Bytes::new())
        .unwrap()
}

/// Body of a buffered response as UTF-8.
pub fn body_string(writer: &ResponseWriter) -> String {
    String::from_utf8(writer.body().to_vec()).unwrap()
}

/// Middleware appending `value` to `result` before calling the next handler.
pub fn ordered_middleware(result: &Arc<Mutex<String>>, value: &'static str) -> Middleware {
    let result = Arc::clone(result);
    middleware_fn(move |next: Handler| -> Handler {
        let result = Arc::clone(&result);
        handler_fn(move |response, request| {
            result.lock().unwrap().push_str(value);
            next(response, request)
        })
    })
}

/// Handler doing nothing; the response ends up 204.
pub fn noop(_: &mut switchyard::Response, _: &mut switchyard::Request) {}

/// A running server on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server task.
    pub async fn stop(self) {
        self.shutdown.trigger();
        self.handle.await.unwrap().unwrap();
    }
}

/// Serve `router` on `127.0.0.1:0`.
pub async fn start_server(router: Router) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(router);
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));
    TestServer {
        addr,
        shutdown,
        handle,
    }
}
