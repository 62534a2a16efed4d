//! Service registry and route selection.
//!
//! # Responsibilities
//! - Keep services in registration order
//! - Reject ambiguous roots at registration time
//! - Resolve a path to the services whose root matches a prefix of it
//! - Select one route for a request (root match, then negotiation)
//!
//! # Design Decisions
//! - Append-only; a registry is built once and then only read
//! - Ranking: root specificity first, registration order second (first wins)
//! - The first resolved service with a path match owns the request;
//!   its method/content failures are final

use crate::routing::dispatcher::RequestHead;
use crate::routing::error::{DispatchError, RoutingError};
use crate::routing::negotiate::{negotiate, Candidate};
use crate::routing::route::Route;
use crate::routing::service::Service;
use crate::routing::template::{decode_segments, PathParams};

/// Ordered, append-only set of services.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    services: Vec<Service>,
}

/// A service whose root template matched a prefix of the path.
#[derive(Debug, Clone)]
pub struct RootMatch<'r> {
    pub service: &'r Service,
    /// Registration position of the service.
    pub index: usize,
    pub params: PathParams,
    /// Number of path segments the root consumed.
    pub consumed: usize,
}

/// The outcome of a successful match.
#[derive(Debug, Clone)]
pub struct Selection<'r> {
    pub service: &'r Service,
    pub route: &'r Route,
    /// Root and route parameters, root first.
    pub params: PathParams,
    /// Decoded path left over after the root match.
    pub remaining: String,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a service. Fails if a service with the same root shape exists.
    pub fn register(&mut self, service: Service) -> Result<(), RoutingError> {
        if let Some(existing) = self
            .services
            .iter()
            .find(|s| s.root().same_shape(service.root()))
        {
            return Err(RoutingError::DuplicateRoot(format!(
                "{} (conflicts with {})",
                service.root(),
                existing.root()
            )));
        }

        tracing::debug!(
            root = %service.root(),
            routes = service.routes().len(),
            position = self.services.len(),
            "Service registered"
        );
        self.services.push(service);
        Ok(())
    }

    /// Services in registration order.
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Every service whose root prefix-matches the raw `path`, best first.
    ///
    /// A path with invalid percent-encoding resolves to nothing.
    pub fn resolve(&self, path: &str) -> Vec<RootMatch<'_>> {
        match decode_segments(path) {
            Some(segments) => {
                let parts: Vec<&str> = segments.iter().map(String::as_str).collect();
                self.resolve_segments(&parts)
            }
            None => Vec::new(),
        }
    }

    fn resolve_segments(&self, parts: &[&str]) -> Vec<RootMatch<'_>> {
        let mut matches: Vec<RootMatch<'_>> = self
            .services
            .iter()
            .enumerate()
            .filter_map(|(index, service)| {
                service
                    .root()
                    .match_segments(parts)
                    .map(|(consumed, params)| RootMatch {
                        service,
                        index,
                        params,
                        consumed,
                    })
            })
            .collect();

        // Stable sort keeps registration order among equals.
        matches.sort_by(|a, b| {
            b.service
                .root()
                .specificity()
                .cmp(&a.service.root().specificity())
        });
        matches
    }

    /// Select the single route that handles `head`.
    pub fn select(&self, head: &RequestHead<'_>) -> Result<Selection<'_>, DispatchError> {
        let Some(segments) = decode_segments(head.path) else {
            tracing::debug!(path = %head.path, "Invalid percent-encoding in path");
            return Err(DispatchError::NotFound);
        };
        let parts: Vec<&str> = segments.iter().map(String::as_str).collect();

        for root in self.resolve_segments(&parts) {
            let rest = &parts[root.consumed..];
            let candidates: Vec<Candidate<'_>> = root
                .service
                .routes()
                .iter()
                .enumerate()
                .filter_map(|(index, route)| {
                    route
                        .template()
                        .match_full_segments(rest)
                        .map(|params| Candidate { route, index, params })
                })
                .collect();

            let remaining = format!("/{}", rest.join("/"));
            if candidates.is_empty() {
                tracing::trace!(
                    root = %root.service.root(),
                    remaining = %remaining,
                    "Root matched but no route path did"
                );
                continue;
            }

            let chosen = negotiate(candidates, head.method, head.content_type, head.accept)?;

            let mut params = root.params;
            params.extend(chosen.params);
            return Ok(Selection {
                service: root.service,
                route: chosen.route,
                params,
                remaining,
            });
        }

        Err(DispatchError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;

    async fn ok(_req: Request<Body>, _params: PathParams) -> &'static str {
        "ok"
    }

    fn service(root: &str, routes: &[(&str, &str)]) -> Service {
        routes
            .iter()
            .fold(Service::builder(root), |builder, (method, path)| {
                builder.route(crate::routing::route::RouteBuilder::new(*method).path(*path).to(ok))
            })
            .build()
            .unwrap()
    }

    fn registry(services: Vec<Service>) -> Registry {
        let mut registry = Registry::new();
        for s in services {
            registry.register(s).unwrap();
        }
        registry
    }

    fn get(path: &str) -> RequestHead<'_> {
        RequestHead::new("GET", path)
    }

    #[test]
    fn test_duplicate_root_rejected() {
        let mut registry = Registry::new();
        registry.register(service("/a/{id}", &[])).unwrap();
        let err = registry.register(service("/a/{key}", &[])).unwrap_err();
        assert!(matches!(err, RoutingError::DuplicateRoot(_)));

        let mut registry = Registry::new();
        registry.register(service("", &[])).unwrap();
        assert!(registry.register(service("/", &[])).is_err());
    }

    #[test]
    fn test_resolve_orders_by_specificity() {
        let registry = registry(vec![
            service("/", &[]),
            service("/a/{id}", &[]),
            service("/a/b", &[]),
            service("/a", &[]),
        ]);
        let roots: Vec<&str> = registry
            .resolve("/a/b")
            .iter()
            .map(|m| m.service.root().as_str())
            .collect();
        assert_eq!(roots, ["/a/b", "/a/{id}", "/a", "/"]);
    }

    #[test]
    fn test_resolve_empty_when_nothing_matches() {
        let registry = registry(vec![service("/a", &[])]);
        assert!(registry.resolve("/b").is_empty());
        assert_eq!(registry.select(&get("/b")).unwrap_err(), DispatchError::NotFound);
    }

    #[test]
    fn test_literal_root_beats_param_root() {
        let registry = registry(vec![
            service("/a/{id}", &[("GET", "")]),
            service("/a/b", &[("GET", "")]),
        ]);
        let selection = registry.select(&get("/a/b")).unwrap();
        assert_eq!(selection.service.root().as_str(), "/a/b");

        let selection = registry.select(&get("/a/c")).unwrap();
        assert_eq!(selection.service.root().as_str(), "/a/{id}");
        assert_eq!(selection.params.get("id"), Some("c"));
    }

    #[test]
    fn test_empty_root_never_shadows() {
        let registry = registry(vec![
            service("/", &[("GET", "/{rest:*}")]),
            service("/users", &[("GET", "/{id}")]),
        ]);
        let selection = registry.select(&get("/users/7")).unwrap();
        assert_eq!(selection.service.root().as_str(), "/users");

        // falls back to the root service when nothing else has a route for the path
        let selection = registry.select(&get("/users/7/avatar")).unwrap();
        assert_eq!(selection.service.root().as_str(), "/");
        assert_eq!(selection.params.get("rest"), Some("users/7/avatar"));
    }

    #[test]
    fn test_bad_escape_resolves_nothing() {
        let registry = registry(vec![service("/", &[("GET", "/{rest:*}")])]);
        assert!(registry.resolve("/a/%zz").is_empty());
        assert_eq!(registry.select(&get("/a/%zz")).unwrap_err(), DispatchError::NotFound);
    }

    #[test]
    fn test_root_and_route_params_are_merged() {
        let registry = registry(vec![service("/users/{user}", &[("GET", "/orders/{order}")])]);
        let selection = registry.select(&get("/users/u1/orders/o9")).unwrap();
        let params: Vec<(&str, &str)> = selection.params.iter().collect();
        assert_eq!(params, [("user", "u1"), ("order", "o9")]);
        assert_eq!(selection.remaining, "/orders/o9");
    }

    #[test]
    fn test_more_specific_root_wins_in_any_order() {
        let forward = registry(vec![
            service("/{a}", &[("GET", "/x")]),
            service("/{b}/x", &[("GET", "")]),
        ]);
        let backward = registry(vec![
            service("/{b}/x", &[("GET", "")]),
            service("/{a}", &[("GET", "/x")]),
        ]);
        for registry in [forward, backward] {
            let selection = registry.select(&get("/1/x")).unwrap();
            assert_eq!(selection.service.root().as_str(), "/{b}/x");
        }
    }

    #[test]
    fn test_swapping_registration_swaps_equal_routes() {
        let first = registry(vec![service("/", &[("GET", "/{a}"), ("GET", "/{b}")])]);
        let selection = first.select(&get("/x")).unwrap();
        assert_eq!(selection.route.template().as_str(), "/{a}");

        let swapped = registry(vec![service("/", &[("GET", "/{b}"), ("GET", "/{a}")])]);
        let selection = swapped.select(&get("/x")).unwrap();
        assert_eq!(selection.route.template().as_str(), "/{b}");
    }

    #[test]
    fn test_method_not_allowed_reported_from_owning_service() {
        let registry = registry(vec![service(
            "/items",
            &[("POST", ""), ("PUT", "/{id}"), ("DELETE", "/{id}")],
        )]);
        let err = registry.select(&get("/items/3")).unwrap_err();
        assert_eq!(
            err,
            DispatchError::MethodNotAllowed {
                allowed: vec!["PUT".into(), "DELETE".into()]
            }
        );
    }
}
