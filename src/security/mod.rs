//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Router::cors(options)
//!     → options attached to every request the router dispatches
//!     → cors.rs middleware (common headers, preflight answer)
//!     → Pass to route handler
//! ```
//!
//! # Design Decisions
//! - One policy per router, inherited by subrouters created afterwards
//! - Preflight requests are answered before reaching route handlers unless passthrough is set

pub mod cors;

pub use cors::{cors_middleware, CorsOptions};
