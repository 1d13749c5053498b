//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Init logging/metrics → Build router → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast → Server stops accepting → In-flight requests drain → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then observability, then listeners
//! - One broadcast channel fans the shutdown out to every long-running task

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
