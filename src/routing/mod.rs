//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, Content-Type, Accept)
//!     → dispatcher.rs (read the request head, drive the stages)
//!     → registry.rs (decode segments; services whose root matches a prefix, best first)
//!     → template.rs (routes whose template matches the remaining path)
//!     → negotiate.rs (method → Content-Type → Accept, then tie-breaks)
//!     → Return: one Route with bound params, or a DispatchError
//!
//! Registration (at startup):
//!     ServiceBuilder / RouteBuilder
//!     → Compile templates and media types
//!     → Registry::register (reject duplicate roots)
//!     → Freeze inside Dispatcher (swapped whole on reload)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment matching only)
//! - Deterministic: same input always matches same route
//! - Ties go to the first registered service/route

pub mod dispatcher;
pub mod error;
pub mod media;
pub mod negotiate;
pub mod registry;
pub mod route;
pub mod service;
pub mod template;

pub use dispatcher::{Dispatcher, HeaderText, RequestHead, Stage};
pub use error::{DispatchError, RoutingError};
pub use media::MediaRange;
pub use registry::{Registry, Selection};
pub use route::{Handler, Route, RouteBuilder};
pub use service::{Service, ServiceBuilder};
pub use template::{PathParams, PathTemplate};
