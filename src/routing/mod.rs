//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (prefix check, subrouters depth-first, then routes)
//!     → matcher.rs (compiled patterns, RouteMatch accumulator)
//!     → route.rs (method check; matched route or sentinel)
//!
//! Dispatch:
//!     root middleware → ... → matched router middleware
//!     → route middleware → handler
//!     → status.rs (render empty error responses)
//! ```
//!
//! # Design Decisions
//! - Tree built at startup, read-only while serving
//! - First match wins, in declaration order
//! - Patterns compiled once at registration and cached process-wide
//! - Not-found and method-not-allowed are sentinel routes, dispatched like any other

pub mod error;
pub mod matcher;
pub mod middleware;
pub mod route;
pub mod router;
pub mod static_files;
pub mod status;

pub use error::RouterError;
pub use matcher::{clear_regex_cache, RouteMatch, RoutePattern};
pub use middleware::{handler_fn, middleware_fn, Handler, Middleware, MiddlewareHolder};
pub use route::{method_not_allowed_route, not_found_route, Route};
pub use router::Router;
pub use static_files::{clean_static_path, static_handler};
pub use status::{error_status_handler, panic_status_handler};
