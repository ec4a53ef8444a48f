//! HTTP hosting adapter.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum serve, tower-http layers)
//!         set x-request-id → trace → propagate x-request-id
//!         → body limit → timeout
//!     → RestHandler::handle (routing + dispatch)
//!     → RequestContext::into_response
//!     → Send to client
//! ```

pub mod server;

pub use server::HttpServer;
