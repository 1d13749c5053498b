//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML/JSON)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated)
//!     → ConfigHandle (ArcSwap) shared by the router tree and the server
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap inside the ConfigHandle
//!     → next request observes new config
//! ```
//!
//! # Design Decisions
//! - Readers never block: request handling loads a snapshot from the ArcSwap
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

use arc_swap::ArcSwap;
use std::sync::Arc;

pub use loader::{load_config, ConfigError};
pub use schema::{AppConfig, AppSettings, LogFormat, ObservabilityConfig, Protocol, ServerConfig};
pub use validation::ValidationError;

/// Shared, swappable configuration.
///
/// Cloning the handle shares the same underlying slot, so a `store` through any clone is seen by
/// every holder.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    inner: Arc<ArcSwap<AppConfig>>,
}

impl ConfigHandle {
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    /// Current configuration snapshot.
    pub fn load(&self) -> Arc<AppConfig> {
        self.inner.load_full()
    }

    /// Replace the configuration.
    pub fn store(&self, config: AppConfig) {
        self.inner.store(Arc::new(config));
    }

    /// Apply a change to a copy of the current configuration and publish it.
    pub fn update(&self, change: impl FnOnce(&mut AppConfig)) {
        let mut config = AppConfig::clone(&self.load());
        change(&mut config);
        self.store(config);
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
