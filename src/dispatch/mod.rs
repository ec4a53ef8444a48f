//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Request<Body>
//!     → rest_handler.rs (ROUTE_RESOLUTION against the table snapshot)
//!         no router / no route → 404, nothing else runs
//!     → context.rs (RequestContext bound to route + params)
//!     → BEFORE_CHAIN: global hooks, then route hooks, each awaited
//!         next()        → continue
//!         send / error  → stop, response finalized
//!         neither       → stop, request unresolved
//!     → HANDLER: route handler awaited, ends with send / error
//!     → reply.rs (status, content type, body)
//!     → RequestContext returned to the caller
//! ```
//!
//! # Design Decisions
//! - Hooks and handlers share one async `Handler` contract
//! - Single owner of the context per request; no locks on the hot path
//! - Handler panics are not caught here

pub mod body;
pub mod context;
pub mod handler;
pub mod reply;
pub mod rest_handler;

pub use body::BodyError;
pub use context::{Phase, RequestContext, X_REQUEST_ID};
pub use handler::{BoxFuture, Handler};
pub use reply::{Payload, Reply, APPLICATION_JSON, TEXT_PLAIN};
pub use rest_handler::{HandlerConfig, RestHandler, DEFAULT_MAX_BODY_SIZE};
