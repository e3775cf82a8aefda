//! Upstream URL construction.
//!
//! The proxy root maps onto the target's base path; deeper inbound paths are
//! appended after it, e.g. with a target of `https://host/macros/s/ID/exec`:
//!
//! ```text
//! /            → https://host/macros/s/ID/exec
//! /sub?x=1     → https://host/macros/s/ID/exec/sub?x=1
//! ```

use url::Url;

use crate::upstream::target::UpstreamTarget;

/// Map an inbound request URL onto the upstream target.
///
/// The inbound query replaces any query on the target. Path segments are not
/// re-encoded and nothing is validated; whatever results is sent upstream.
pub fn build_upstream_url(inbound: &Url, target: &UpstreamTarget) -> Url {
    let mut upstream = target.base().clone();

    let inbound_path = inbound.path();
    if inbound_path != "/" {
        let base_path = target.base().path();
        // A target ending in '/' (or a bare host, whose path is "/") would
        // otherwise produce "//" at the join.
        let base_path = base_path.strip_suffix('/').unwrap_or(base_path);
        let joined = format!("{}{}", base_path, inbound_path);
        upstream.set_path(&joined);
    }

    upstream.set_query(inbound.query());
    upstream.set_fragment(None);
    upstream
}
