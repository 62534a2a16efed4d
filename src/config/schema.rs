//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML. Every table
//! has defaults so a minimal file only lists its services.

use serde::{Deserialize, Serialize};

/// Root configuration for the router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Services (route groups), in registration order.
    pub services: Vec<ServiceConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (dispatch plus handler) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` overrides it.
    pub log_level: String,

    /// Log line format: `full` or `compact`.
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "full".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A route group sharing one root path.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Root path template, matched as a prefix (e.g., "/users/{tenant}").
    #[serde(default = "default_root_path")]
    pub root_path: String,

    /// Default request media types for the routes below.
    #[serde(default)]
    pub consumes: Vec<String>,

    /// Default response media types for the routes below.
    #[serde(default)]
    pub produces: Vec<String>,

    /// Routes, in registration order.
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// A single route inside a service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logs and responses.
    pub name: Option<String>,

    /// HTTP method, case-sensitive.
    pub method: String,

    /// Sub-path template relative to the service root.
    #[serde(default)]
    pub path: String,

    /// Overrides the service's `consumes`.
    pub consumes: Option<Vec<String>>,

    /// Overrides the service's `produces`.
    pub produces: Option<Vec<String>>,

    /// Status code returned by the route.
    #[serde(default = "default_status")]
    pub status: u16,
}

fn default_root_path() -> String {
    "/".to_string()
}

fn default_status() -> u16 {
    200
}
