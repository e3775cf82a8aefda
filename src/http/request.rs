//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Reconstruct the absolute URL the caller used to reach the proxy
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A configured public origin wins over anything the request claims

use axum::http::header::HOST;
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use url::Url;
use uuid::Uuid;

use crate::error::ProxyError;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates `x-request-id` values for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = HeaderValue::from_str(&Uuid::new_v4().to_string()).ok()?;
        Some(RequestId::new(id))
    }
}

/// Request ID of a request for logging, or `"unknown"`.
pub fn request_id(parts: &Parts) -> &str {
    parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Rebuild the absolute URL of an inbound request.
///
/// With a `public_origin`, only the path and query come from the request.
/// Otherwise scheme and authority come from an absolute request URI, falling
/// back to `http` and the `Host` header.
pub fn inbound_url(parts: &Parts, public_origin: Option<&Url>) -> Result<Url, ProxyError> {
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let origin = match public_origin {
        Some(origin) => origin.origin().ascii_serialization(),
        None => {
            let scheme = parts.uri.scheme_str().unwrap_or("http");
            let authority = match parts.uri.authority() {
                Some(authority) => authority.as_str(),
                None => parts
                    .headers
                    .get(HOST)
                    .and_then(|h| h.to_str().ok())
                    .filter(|h| !h.is_empty())
                    .ok_or_else(|| ProxyError::BadRequest("missing Host header".to_string()))?,
            };
            format!("{}://{}", scheme, authority)
        }
    };

    let raw = format!("{}{}", origin, path_and_query);
    let url = Url::parse(&raw)
        .map_err(|e| ProxyError::BadRequest(format!("invalid request URL {:?}: {}", raw, e)))?;
    if url.host_str().is_none() {
        return Err(ProxyError::BadRequest(format!("request URL {:?} has no host", raw)));
    }
    Ok(url)
}
