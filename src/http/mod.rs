//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, proxy handler)
//!     → request.rs (request ID, inbound URL)
//!     → security::headers / upstream (sanitize, map, forward)
//!     → response.rs (rewrite headers via cookie.rs and location.rs)
//!     → Send to client
//! ```

pub mod cookie;
pub mod location;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{HttpServer, ServerError};
