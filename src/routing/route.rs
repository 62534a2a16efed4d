//! Routes and the handler capability.
//!
//! A [`Route`] is the unit the negotiator picks from: method, compiled
//! sub-path template, consumes/produces contract and an opaque handler.
//! Routes are immutable once built; use [`RouteBuilder`] to declare them.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};

use crate::routing::error::RoutingError;
use crate::routing::media::MediaRange;
use crate::routing::template::{PathParams, PathTemplate};

/// Future returned by a [`Handler`].
pub type HandlerFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// The capability invoked once a route has been selected.
///
/// The router never looks inside a handler; it owns writing the response.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, request: Request<Body>, params: PathParams) -> HandlerFuture;
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request<Body>, PathParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    fn call(&self, request: Request<Body>, params: PathParams) -> HandlerFuture {
        let fut = (self)(request, params);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// An immutable matching unit.
#[derive(Clone)]
pub struct Route {
    method: String,
    template: PathTemplate,
    consumes: Vec<MediaRange>,
    produces: Vec<MediaRange>,
    name: Option<String>,
    handler: Arc<dyn Handler>,
}

impl Route {
    /// HTTP method, compared case-sensitively.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Template relative to the service root.
    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    pub fn consumes(&self) -> &[MediaRange] {
        &self.consumes
    }

    pub fn produces(&self) -> &[MediaRange] {
        &self.produces
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("template", &self.template.as_str())
            .field("consumes", &self.consumes)
            .field("produces", &self.produces)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Accumulates route fields; [`RouteBuilder::build`] compiles them.
///
/// Errors (bad template, bad media type) are reported by `build`, so
/// declarations can be chained freely.
#[derive(Clone)]
pub struct RouteBuilder {
    method: String,
    path: String,
    consumes: Option<Vec<String>>,
    produces: Option<Vec<String>>,
    name: Option<String>,
    handler: Option<Arc<dyn Handler>>,
}

impl RouteBuilder {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: String::new(),
            consumes: None,
            produces: None,
            name: None,
            handler: None,
        }
    }

    /// Sub-path relative to the service root. Defaults to the root itself.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Media types this route accepts as request body.
    pub fn consumes<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.consumes = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Media types this route can respond with, in preference order.
    pub fn produces<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.produces = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Name used in logs and diagnostics.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn to<H: Handler>(mut self, handler: H) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Same as [`RouteBuilder::to`] for an already shared handler.
    pub fn to_shared(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Fill consumes/produces from the service when the route left them unset.
    pub(crate) fn copy_defaults(&mut self, consumes: &[String], produces: &[String]) {
        if self.consumes.is_none() && !consumes.is_empty() {
            self.consumes = Some(consumes.to_vec());
        }
        if self.produces.is_none() && !produces.is_empty() {
            self.produces = Some(produces.to_vec());
        }
    }

    pub fn build(self) -> Result<Route, RoutingError> {
        if !is_method(&self.method) {
            return Err(RoutingError::InvalidMethod(self.method));
        }
        let template = PathTemplate::compile(&self.path)?;
        let consumes = parse_ranges(self.consumes)?;
        let produces = parse_ranges(self.produces)?;
        let handler = self.handler.ok_or_else(|| RoutingError::MissingHandler {
            method: self.method.clone(),
            path: self.path.clone(),
        })?;

        Ok(Route {
            method: self.method,
            template,
            consumes,
            produces,
            name: self.name,
            handler,
        })
    }
}

fn parse_ranges(types: Option<Vec<String>>) -> Result<Vec<MediaRange>, RoutingError> {
    match types {
        Some(types) if !types.is_empty() => types.iter().map(|t| t.parse()).collect(),
        _ => Ok(vec![MediaRange::any()]),
    }
}

/// HTTP method token (RFC 7230 `tchar`).
pub(crate) fn is_method(method: &str) -> bool {
    !method.is_empty()
        && method
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c))
}
