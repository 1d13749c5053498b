//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, body collection)
//!     → protocol.rs (redirect requests made with the wrong scheme)
//!     → [routing layer matches and dispatches]
//!     → request.rs / response.rs (what handlers see and write)
//!     → ResponseWriter converted back into an Axum response
//! ```

pub mod mime;
pub mod protocol;
pub mod request;
pub mod response;
pub mod server;

pub use request::{ConnectionScheme, RawRequest, Request};
pub use response::{Response, ResponseWriter};
pub use server::HttpServer;
