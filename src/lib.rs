//! JSR-311 style HTTP request router.
//!
//! Services (route groups) are registered once at startup; each request is
//! matched to exactly one route by root path, sub-path, method and media
//! type negotiation, then handed to that route's handler.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::RouterConfig;
pub use http::HttpServer;
pub use lifecycle::shutdown::Shutdown;
pub use routing::{Dispatcher, Registry, RouteBuilder, Service};
