//! Handler bound to routes declared in configuration.
//!
//! Responds with the configured status and a JSON description of the match:
//!
//! ```json
//! {"service": "/users", "route": "find-user", "method": "GET",
//!  "params": {"id": "42"}, "request_id": "…"}
//! ```

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::http::request::RequestIdExt;
use crate::routing::route::{Handler, HandlerFuture};
use crate::routing::PathParams;

/// Echoes the selected route back to the client.
#[derive(Debug, Clone)]
pub struct EchoHandler {
    service: String,
    route: String,
    status: StatusCode,
}

impl EchoHandler {
    /// Out-of-range statuses fall back to 500; validation rejects them earlier.
    pub fn new(service: impl Into<String>, route: impl Into<String>, status: u16) -> Self {
        Self {
            service: service.into(),
            route: route.into(),
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl Handler for EchoHandler {
    fn call(&self, request: Request<Body>, params: PathParams) -> HandlerFuture {
        let body = json!({
            "service": self.service,
            "route": self.route,
            "method": request.method().as_str(),
            "params": params,
            "request_id": request.request_id(),
        });
        let status = self.status;
        Box::pin(async move { (status, Json(body)).into_response() })
    }
}
