//! Top-level request dispatch.
//!
//! # State machine
//! ```text
//! RootMatch ──▶ MethodFilter ──▶ ContentNegotiate ──▶ Dispatched
//!     │              │                  │
//!     ▼              ▼                  ▼
//! NotFound    MethodNotAllowed   UnsupportedMediaType / NotAcceptable
//! ```
//!
//! # Design Decisions
//! - Stage order is fixed: a path that exists with the wrong method is a 405,
//!   never a 404, and a wrong method is never reported as a 406
//! - The registry snapshot is read lock-free; a reload swaps the whole snapshot
//!   and in-flight requests finish on the one they loaded
//! - The handler is invoked exactly once and owns the response

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request};
use axum::response::{IntoResponse, Response};

use crate::observability::metrics;
use crate::routing::error::DispatchError;
use crate::routing::registry::{Registry, Selection};
use crate::routing::route::Handler;
use crate::routing::template::PathParams;

/// A request header as the router sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderText<'a> {
    #[default]
    Absent,
    Text(&'a str),
    /// Present, but not visible ASCII.
    Unreadable,
}

impl<'a> HeaderText<'a> {
    /// Read `name` from `headers`.
    pub fn of(headers: &'a HeaderMap, name: HeaderName) -> Self {
        match headers.get(name).map(HeaderValue::to_str) {
            None => HeaderText::Absent,
            Some(Ok(text)) => HeaderText::Text(text),
            Some(Err(_)) => HeaderText::Unreadable,
        }
    }

    /// The value, if it could be read.
    pub fn text(self) -> Option<&'a str> {
        match self {
            HeaderText::Text(text) => Some(text),
            HeaderText::Absent | HeaderText::Unreadable => None,
        }
    }
}

impl<'a> From<Option<&'a str>> for HeaderText<'a> {
    fn from(value: Option<&'a str>) -> Self {
        value.map_or(HeaderText::Absent, HeaderText::Text)
    }
}

/// What the router needs to know about a request.
///
/// `path` is the raw request path; it is split into segments and each one is
/// percent-decoded during selection.
///
/// An unreadable `Content-Type` matches no route (415). An unreadable `Accept`
/// is disregarded and negotiation proceeds as if it were absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHead<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub content_type: HeaderText<'a>,
    pub accept: HeaderText<'a>,
}

impl<'a> RequestHead<'a> {
    pub fn new(method: &'a str, path: &'a str) -> Self {
        Self {
            method,
            path,
            content_type: HeaderText::Absent,
            accept: HeaderText::Absent,
        }
    }

    pub fn content_type(mut self, content_type: impl Into<HeaderText<'a>>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn accept(mut self, accept: impl Into<HeaderText<'a>>) -> Self {
        self.accept = accept.into();
        self
    }

    /// Read method, path and negotiation headers from `request`.
    pub fn from_request<B>(request: &'a Request<B>) -> Self {
        let headers = request.headers();
        Self::new(request.method().as_str(), request.uri().path())
            .content_type(HeaderText::of(headers, header::CONTENT_TYPE))
            .accept(HeaderText::of(headers, header::ACCEPT))
    }
}

/// Dispatch stages, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RootMatch,
    MethodFilter,
    ContentNegotiate,
    Dispatched,
}

impl Stage {
    /// The stage that produced a failure.
    pub fn of(error: &DispatchError) -> Stage {
        match error {
            DispatchError::NotFound => Stage::RootMatch,
            DispatchError::MethodNotAllowed { .. } => Stage::MethodFilter,
            DispatchError::NotAcceptable | DispatchError::UnsupportedMediaType => {
                Stage::ContentNegotiate
            }
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::RootMatch => "root_match",
            Stage::MethodFilter => "method_filter",
            Stage::ContentNegotiate => "content_negotiate",
            Stage::Dispatched => "dispatched",
        };
        f.write_str(name)
    }
}

/// Routes requests against the current registry snapshot.
pub struct Dispatcher {
    registry: ArcSwap<Registry>,
}

impl Dispatcher {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: ArcSwap::from_pointee(registry),
        }
    }

    /// The registry currently used for new requests.
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.load_full()
    }

    /// Replace the registry. Requests already being dispatched are unaffected.
    pub fn reload(&self, registry: Registry) {
        tracing::info!(services = registry.services().len(), "Registry reloaded");
        self.registry.store(Arc::new(registry));
    }

    /// Route a request and invoke the selected handler, or answer with the failure.
    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().clone();
        let registry = self.registry.load_full();

        let selected = registry
            .select(&RequestHead::from_request(&request))
            .map(Bound::from);

        match selected {
            Ok(bound) => {
                tracing::debug!(
                    method = %method,
                    path = %request.uri().path(),
                    root = %bound.root,
                    route = %bound.route_label,
                    stage = %Stage::Dispatched,
                    "Route selected"
                );
                metrics::record_dispatch(&method, Stage::Dispatched, "dispatched", start);
                bound.handler.call(request, bound.params).await
            }
            Err(error) => {
                tracing::debug!(
                    method = %method,
                    path = %request.uri().path(),
                    stage = %Stage::of(&error),
                    error = %error,
                    "No route dispatched"
                );
                metrics::record_dispatch(&method, Stage::of(&error), error.outcome(), start);
                error.into_response()
            }
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("services", &self.registry.load().services().len())
            .finish()
    }
}

/// A selection detached from the registry borrow, ready to invoke.
struct Bound {
    root: String,
    route_label: String,
    handler: Arc<dyn Handler>,
    params: PathParams,
}

impl From<Selection<'_>> for Bound {
    fn from(selection: Selection<'_>) -> Self {
        let route = selection.route;
        Self {
            root: selection.service.root().to_string(),
            route_label: match route.name() {
                Some(name) => name.to_string(),
                None => format!("{} {}", route.method(), route.template()),
            },
            handler: route.handler().clone(),
            params: selection.params,
        }
    }
}
