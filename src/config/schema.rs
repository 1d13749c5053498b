//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the application.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Listener and URL settings.
    pub server: ServerConfig,

    /// Application-level settings.
    pub app: AppSettings,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Scheme the application is expected to be reached with.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }

    /// Port implied by the scheme when none is written in a URL.
    pub fn default_port(&self) -> u16 {
        match self {
            Protocol::Http => 80,
            Protocol::Https => 443,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Public protocol. Requests reaching the server with another scheme are redirected.
    pub protocol: Protocol,

    /// Host used to bind the listener and to build redirect targets.
    pub host: String,

    /// Plain HTTP port.
    pub port: u16,

    /// HTTPS port, used in redirect targets when `protocol` is `https`.
    pub https_port: u16,

    /// Maximum accepted request body size in bytes.
    pub max_body_size: usize,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    /// Address the listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::Http,
            host: "127.0.0.1".to_string(),
            port: 8080,
            https_port: 8443,
            max_body_size: 10 * 1024 * 1024, // 10MB
            request_timeout_secs: 30,
        }
    }
}

/// Application settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    /// Application name, used in logs.
    pub name: String,

    /// Language used when a request carries no usable `Accept-Language` header.
    pub default_language: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "switchyard".to_string(),
            default_language: "en-US".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter, overridden by `RUST_LOG`.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Address of the Prometheus scrape endpoint.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "switchyard=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
