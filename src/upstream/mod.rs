//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! inbound URL + UpstreamTarget
//!     → url.rs (map path and query onto the target)
//!     → forwarder.rs (send with manual redirects, stream bodies)
//!     → raw upstream response handed to http::response
//! ```
//!
//! # Design Decisions
//! - Exactly one upstream per deployment, fixed at startup
//! - No retries, no load balancing, no caching

pub mod forwarder;
pub mod target;
pub mod url;

pub use forwarder::{Forwarder, OutboundRequest};
pub use target::{TargetError, UpstreamTarget};
pub use url::build_upstream_url;
