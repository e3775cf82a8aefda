//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request headers:
//!     → headers.rs (drop host/infrastructure headers, set origin/referer)
//!     → forwarded upstream
//! ```
//!
//! # Design Decisions
//! - Nothing identifying the proxy's host or infrastructure reaches the upstream
//! - The upstream sees a same-origin request

pub mod headers;
