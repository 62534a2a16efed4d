//! Responses for requests no route could take.
//!
//! | Failure                | Status | Extra              |
//! |------------------------|--------|--------------------|
//! | `NotFound`             | 404    |                    |
//! | `MethodNotAllowed`     | 405    | `Allow` header     |
//! | `NotAcceptable`        | 406    |                    |
//! | `UnsupportedMediaType` | 415    |                    |
//!
//! Bodies are short plain-text reasons; successful responses are entirely
//! the handler's business.

use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};

use crate::routing::DispatchError;

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let allow = match &self {
            DispatchError::MethodNotAllowed { allowed } => {
                HeaderValue::from_str(&allowed.join(", ")).ok()
            }
            _ => None,
        };

        let mut response = (self.status(), self.to_string()).into_response();
        if let Some(allow) = allow {
            response.headers_mut().insert(header::ALLOW, allow);
        }
        response
    }
}
