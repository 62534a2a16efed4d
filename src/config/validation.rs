//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, timeouts, log format, status codes
//! - Compile every service exactly as the router will and detect conflicting roots
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::routing::{Registry, RoutingError};

const LOG_FORMATS: [&str; 2] = ["full", "compact"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is not a socket address: {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than 0")]
    ZeroTimeout,

    #[error("unknown log format {0:?} (expected one of: full, compact)")]
    UnknownLogFormat(String),

    #[error("route {route:?} has invalid status {status}")]
    InvalidStatus { route: String, status: u16 },

    #[error("service {root:?}: {source}")]
    Service {
        root: String,
        #[source]
        source: RoutingError,
    },
}

/// Check a parsed configuration.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if !LOG_FORMATS.contains(&config.observability.log_format.as_str()) {
        errors.push(ValidationError::UnknownLogFormat(
            config.observability.log_format.clone(),
        ));
    }

    // Build into a scratch registry so duplicate roots surface here too.
    let mut registry = Registry::new();
    for service in &config.services {
        for route in &service.routes {
            if !(100..=599).contains(&route.status) {
                errors.push(ValidationError::InvalidStatus {
                    route: route.label(),
                    status: route.status,
                });
            }
        }

        let result = service
            .to_builder()
            .build()
            .and_then(|built| registry.register(built));
        if let Err(source) = result {
            errors.push(ValidationError::Service {
                root: service.root_path.clone(),
                source,
            });
        }
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
    use crate::config::schema::{RouteConfig, ServiceConfig};

    fn route(method: &str, path: &str) -> RouteConfig {
        RouteConfig {
            name: None,
            method: method.into(),
            path: path.into(),
            consumes: None,
            produces: None,
            status: 200,
        }
    }

    fn service(root: &str, routes: Vec<RouteConfig>) -> ServiceConfig {
        ServiceConfig {
            root_path: root.into(),
            consumes: Vec::new(),
            produces: Vec::new(),
            routes,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&RouterConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = RouterConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.request_secs = 0;
        config.observability.log_format = "json".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::ZeroTimeout));
        assert!(errors.contains(&ValidationError::UnknownLogFormat("json".into())));
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = RouterConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_service_errors() {
        let mut config = RouterConfig::default();
        config.services = vec![
            service("/users", vec![route("GET", "/{id}")]),
            service("/users", vec![]),
            service("/orders", vec![route("GET", "/{id")]),
            service("/items", vec![route("", "")]),
        ];
        let mut bad_status = route("GET", "/x");
        bad_status.status = 42;
        config.services.push(service("/status", vec![bad_status]));

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(matches!(
            &errors[0],
            ValidationError::Service { source: RoutingError::DuplicateRoot(_), .. }
        ));
        assert!(matches!(
            &errors[1],
            ValidationError::Service { source: RoutingError::MalformedTemplate { .. }, .. }
        ));
        assert!(matches!(
            &errors[2],
            ValidationError::Service { source: RoutingError::InvalidMethod(_), .. }
        ));
        assert!(matches!(&errors[3], ValidationError::InvalidStatus { status: 42, .. }));
    }
}
