//! Route groups ("services").
//!
//! A [`Service`] owns an ordered set of routes under one root template and
//! the default media types those routes inherit. Build one with
//! [`Service::builder`]:
//!
//! ```ignore
//! let users = Service::builder("/users")
//!     .produces(["application/json"])
//!     .route(Service::get("/{id}").to(find_user))
//!     .route(Service::post("").consumes(["application/json"]).to(create_user))
//!     .build()?;
//! ```

use crate::routing::error::RoutingError;
use crate::routing::route::{Route, RouteBuilder};
use crate::routing::template::PathTemplate;

/// An immutable group of routes sharing a root path.
#[derive(Debug, Clone)]
pub struct Service {
    root: PathTemplate,
    routes: Vec<Route>,
}

impl Service {
    pub fn builder(root: impl Into<String>) -> ServiceBuilder {
        ServiceBuilder {
            root: root.into(),
            consumes: Vec::new(),
            produces: Vec::new(),
            routes: Vec::new(),
        }
    }

    /// Shortcut for `RouteBuilder::new("GET").path(sub_path)`.
    pub fn get(sub_path: impl Into<String>) -> RouteBuilder {
        RouteBuilder::new("GET").path(sub_path)
    }

    pub fn post(sub_path: impl Into<String>) -> RouteBuilder {
        RouteBuilder::new("POST").path(sub_path)
    }

    pub fn put(sub_path: impl Into<String>) -> RouteBuilder {
        RouteBuilder::new("PUT").path(sub_path)
    }

    pub fn delete(sub_path: impl Into<String>) -> RouteBuilder {
        RouteBuilder::new("DELETE").path(sub_path)
    }

    pub fn patch(sub_path: impl Into<String>) -> RouteBuilder {
        RouteBuilder::new("PATCH").path(sub_path)
    }

    pub fn head(sub_path: impl Into<String>) -> RouteBuilder {
        RouteBuilder::new("HEAD").path(sub_path)
    }

    pub fn options(sub_path: impl Into<String>) -> RouteBuilder {
        RouteBuilder::new("OPTIONS").path(sub_path)
    }

    /// Root template, matched as a prefix.
    pub fn root(&self) -> &PathTemplate {
        &self.root
    }

    /// Routes in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

/// Accumulates a service declaration.
#[derive(Clone)]
pub struct ServiceBuilder {
    root: String,
    consumes: Vec<String>,
    produces: Vec<String>,
    routes: Vec<RouteBuilder>,
}

impl ServiceBuilder {
    /// Default request media types for routes that do not declare their own.
    pub fn consumes<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.consumes = types.into_iter().map(Into::into).collect();
        self
    }

    /// Default response media types for routes that do not declare their own.
    pub fn produces<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.produces = types.into_iter().map(Into::into).collect();
        self
    }

    /// Append a route. Order is kept and breaks ties between equal routes.
    pub fn route(mut self, route: RouteBuilder) -> Self {
        self.routes.push(route);
        self
    }

    pub fn build(self) -> Result<Service, RoutingError> {
        let root = PathTemplate::compile(&self.root)?;

        let mut routes = Vec::with_capacity(self.routes.len());
        for mut builder in self.routes {
            builder.copy_defaults(&self.consumes, &self.produces);
            let route = builder.build()?;

            if let Some(name) = route
                .template()
                .param_names()
                .find(|name| root.param_names().any(|r| r == *name))
            {
                return Err(RoutingError::DuplicateParameter {
                    template: format!("{}{}", root, route.template()),
                    name: name.to_string(),
                });
            }
            routes.push(route);
        }

        tracing::debug!(root = %root, routes = routes.len(), "Service built");

        Ok(Service { root, routes })
    }
}
