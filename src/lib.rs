//! Hierarchical HTTP router library.
//!
//! Routers form a tree: each holds middleware, routes and subrouters. A request is matched
//! depth-first, run through the middleware of every router from the root down to the matched
//! route, and finalized by the status handlers.

pub mod config;
pub mod http;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::{AppConfig, ConfigHandle};
pub use http::{HttpServer, Request, Response};
pub use lifecycle::Shutdown;
pub use routing::{Route, Router, RouterError};
pub use security::CorsOptions;
