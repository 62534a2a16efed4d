//! Turning configured services into a registry.
//!
//! Routes declared in configuration have no code behind them, so each one is
//! bound to an [`EchoHandler`] describing the match.

use crate::config::schema::{RouteConfig, ServiceConfig};
use crate::http::echo::EchoHandler;
use crate::routing::{Registry, RouteBuilder, RoutingError, Service, ServiceBuilder};

impl ServiceConfig {
    /// Declare this service with the routing builders.
    pub fn to_builder(&self) -> ServiceBuilder {
        self.routes.iter().fold(
            Service::builder(self.root_path.clone())
                .consumes(self.consumes.iter().cloned())
                .produces(self.produces.iter().cloned()),
            |service, route| service.route(route.to_builder(&self.root_path)),
        )
    }
}

impl RouteConfig {
    fn to_builder(&self, root_path: &str) -> RouteBuilder {
        let mut builder = RouteBuilder::new(self.method.clone())
            .path(self.path.clone())
            .to(EchoHandler::new(root_path, self.label(), self.status));

        if let Some(name) = &self.name {
            builder = builder.name(name.clone());
        }
        if let Some(consumes) = &self.consumes {
            builder = builder.consumes(consumes.iter().cloned());
        }
        if let Some(produces) = &self.produces {
            builder = builder.produces(produces.iter().cloned());
        }
        builder
    }

    /// Name, or `METHOD path` when unnamed.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{} {}", self.method, self.path),
        }
    }
}

/// Build and register every configured service, in order.
pub fn build_registry(services: &[ServiceConfig]) -> Result<Registry, RoutingError> {
    let mut registry = Registry::new();
    for service in services {
        registry.register(service.to_builder().build()?)?;
    }
    Ok(registry)
}
