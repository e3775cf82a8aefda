//! Response handling and transformation.
//!
//! # Responsibilities
//! - Rewrite upstream response headers for the caller's origin
//! - Build the client response around the upstream body stream
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Each rewrite step is a no-op when its header is absent
//! - Rewrite problems degrade to pass-through, never to an error response

use axum::body::Body;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_ENCODING, LOCATION,
    SET_COOKIE,
};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;
use url::Url;

use crate::http::cookie::rewrite_set_cookie;
use crate::http::location::rewrite_location;
use crate::observability::metrics;
use crate::upstream::UpstreamTarget;

/// Rewrite upstream response headers in place.
pub fn rewrite_response_headers(headers: &mut HeaderMap, inbound: &Url, target: &UpstreamTarget) {
    headers.remove(CONTENT_ENCODING);
    rewrite_cookies(headers);
    rewrite_redirect(headers, inbound, target);
    apply_cors(headers, inbound);
}

/// Rewrite every `Set-Cookie` value, keeping them as separate header lines.
pub fn rewrite_cookies(headers: &mut HeaderMap) {
    let originals: Vec<HeaderValue> = headers.get_all(SET_COOKIE).iter().cloned().collect();
    if originals.is_empty() {
        return;
    }

    headers.remove(SET_COOKIE);
    for original in originals {
        let rewritten = std::str::from_utf8(original.as_bytes())
            .ok()
            .and_then(|value| HeaderValue::from_str(&rewrite_set_cookie(value)).ok());
        headers.append(SET_COOKIE, rewritten.unwrap_or(original));
    }
}

/// Point same-host redirects at the proxy's origin.
pub fn rewrite_redirect(headers: &mut HeaderMap, inbound: &Url, target: &UpstreamTarget) {
    let Some(location) = headers.get(LOCATION) else {
        return;
    };

    match rewrite_location(location.as_bytes(), inbound, target) {
        Ok(Some(url)) => match HeaderValue::from_str(url.as_str()) {
            Ok(value) => {
                tracing::debug!(location = %url, "Rewrote redirect location");
                headers.insert(LOCATION, value);
                metrics::record_redirect_rewritten();
            }
            Err(e) => tracing::debug!(error = %e, "Rewritten location is not a header value"),
        },
        Ok(None) => {}
        Err(e) => tracing::debug!(error = %e, "Leaving location header unmodified"),
    }
}

/// Let the caller's own origin read the response with credentials.
pub fn apply_cors(headers: &mut HeaderMap, inbound: &Url) {
    let origin = inbound.origin().ascii_serialization();
    if let Ok(value) = HeaderValue::from_str(&origin) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    headers.insert(
        ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
}

/// Turn a raw upstream response into the client response.
///
/// Status is kept, headers are rewritten, and the body is streamed through.
pub fn into_client_response(
    mut upstream: reqwest::Response,
    inbound: &Url,
    target: &UpstreamTarget,
) -> Response {
    let status = upstream.status();
    let mut headers = std::mem::take(upstream.headers_mut());
    rewrite_response_headers(&mut headers, inbound, target);

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
