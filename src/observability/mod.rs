//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID set by the HTTP layer and carried by the request span
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

pub use self::logging::init_logging;
pub use self::metrics::{init_metrics, record_request};
