//! Routing error definitions.
//!
//! Two families, split by when they surface:
//! - [`RoutingError`]: configuration mistakes, reported while services are
//!   built and registered, never at request time.
//! - [`DispatchError`]: expected match failures for a single request, each
//!   mapped to an HTTP status.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors raised while compiling templates and registering services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// Template syntax could not be compiled.
    #[error("malformed path template {template:?}: {reason}")]
    MalformedTemplate { template: String, reason: String },

    /// A parameter name appears twice across a service's root and route templates.
    #[error("parameter {name:?} is declared twice in {template:?}")]
    DuplicateParameter { template: String, name: String },

    /// Two services share the same root template shape.
    #[error("root path {0:?} is already registered")]
    DuplicateRoot(String),

    /// A consumes/produces entry is not a media range.
    #[error("invalid media type {0:?}")]
    InvalidMediaType(String),

    /// Method is empty or not an HTTP token.
    #[error("invalid HTTP method {0:?}")]
    InvalidMethod(String),

    /// Route was built without a handler.
    #[error("route {method} {path:?} has no handler")]
    MissingHandler { method: String, path: String },
}

impl RoutingError {
    pub(crate) fn malformed(template: &str, reason: impl Into<String>) -> Self {
        RoutingError::MalformedTemplate {
            template: template.to_string(),
            reason: reason.into(),
        }
    }
}

/// Terminal failure of a dispatch. No handler has been invoked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// No service root and route template matched the path.
    #[error("no route matches the request path")]
    NotFound,

    /// The path matched but none of the routes accept the method.
    #[error("method not allowed, allowed: {}", .allowed.join(", "))]
    MethodNotAllowed { allowed: Vec<String> },

    /// None of the remaining routes can produce an acceptable media type.
    #[error("no acceptable representation")]
    NotAcceptable,

    /// None of the remaining routes consume the request content type.
    #[error("unsupported media type")]
    UnsupportedMediaType,
}

impl DispatchError {
    /// HTTP status reported to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::NotFound => StatusCode::NOT_FOUND,
            DispatchError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            DispatchError::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            DispatchError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }

    /// Short label used for metrics and logs.
    pub fn outcome(&self) -> &'static str {
        match self {
            DispatchError::NotFound => "not_found",
            DispatchError::MethodNotAllowed { .. } => "method_not_allowed",
            DispatchError::NotAcceptable => "not_acceptable",
            DispatchError::UnsupportedMediaType => "unsupported_media_type",
        }
    }
}
