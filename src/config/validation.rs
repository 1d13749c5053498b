//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports, sizes)
//! - Detect conflicting settings
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{AppConfig, Protocol};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server.host must not be empty")]
    EmptyHost,

    #[error("server.{0} must be greater than 0")]
    ZeroPort(&'static str),

    #[error("server.port and server.https_port must differ when protocol is https")]
    PortConflict,

    #[error("server.max_body_size must be greater than 0")]
    ZeroBodyLimit,

    #[error("app.default_language must not be empty")]
    EmptyDefaultLanguage,

    #[error("observability.metrics_address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a parsed configuration, collecting every problem.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let server = &config.server;

    if server.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }
    if server.port == 0 {
        errors.push(ValidationError::ZeroPort("port"));
    }
    if server.https_port == 0 {
        errors.push(ValidationError::ZeroPort("https_port"));
    }
    if server.protocol == Protocol::Https && server.port == server.https_port {
        errors.push(ValidationError::PortConflict);
    }
    if server.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.app.default_language.trim().is_empty() {
        errors.push(ValidationError::EmptyDefaultLanguage);
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&AppConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.server.protocol = Protocol::Https;
        config.server.port = 443;
        config.server.https_port = 443;
        config.app.default_language = String::new();
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nowhere".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::PortConflict,
                ValidationError::EmptyDefaultLanguage,
                ValidationError::InvalidMetricsAddress("nowhere".to_string()),
            ]
        );
    }
}
