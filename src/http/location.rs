//! Redirect `Location` rewriting.
//!
//! A redirect that points back at the upstream host is moved onto the proxy's
//! own origin. The upstream path is cut after its entry marker segment, so
//! `https://script.google.com/macros/s/XYZ/exec/sub?x=1` seen through
//! `https://proxy.example/` becomes `https://proxy.example/sub?x=1`.

use thiserror::Error;
use url::Url;

use crate::upstream::UpstreamTarget;

/// A `Location` value that could not be interpreted. Never fatal.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("location header is not valid UTF-8")]
    NotUtf8,

    #[error("location {location:?} does not resolve against the upstream: {source}")]
    Unresolvable {
        location: String,
        #[source]
        source: url::ParseError,
    },
}

/// Rewrite a redirect target for the caller.
///
/// Returns `Ok(None)` when the location points somewhere other than the
/// upstream host and must be left alone.
pub fn rewrite_location(
    location: &[u8],
    inbound: &Url,
    target: &UpstreamTarget,
) -> Result<Option<Url>, LocationError> {
    let location = std::str::from_utf8(location).map_err(|_| LocationError::NotUtf8)?;
    let resolved = target
        .base()
        .join(location)
        .map_err(|source| LocationError::Unresolvable {
            location: location.to_string(),
            source,
        })?;

    if !target.is_same_host(&resolved) {
        return Ok(None);
    }

    let path = match target.entry_marker() {
        Some(marker) => strip_through_marker(resolved.path(), marker),
        None => resolved.path(),
    };

    let mut rewritten = inbound.clone();
    rewritten.set_path(if path.is_empty() { "/" } else { path });
    rewritten.set_query(resolved.query());
    rewritten.set_fragment(None);
    Ok(Some(rewritten))
}

/// Remove everything up to and including the last whole-segment occurrence of `marker`.
///
/// Returns the path unchanged when the marker does not occur as a segment.
pub fn strip_through_marker<'a>(path: &'a str, marker: &str) -> &'a str {
    for (start, _) in path.rmatch_indices(marker) {
        let rest = &path[start + marker.len()..];
        if rest.is_empty() || rest.starts_with('/') {
            return rest;
        }
    }
    path
}
