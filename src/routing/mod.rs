//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → table.rs (method router lookup, `*` fallback)
//!     → method_router.rs (ordered scan)
//!     → route.rs (structural match, parameter binding)
//!     → Return: RouteMatch { route, params } or no match
//!
//! Route Compilation (at startup):
//!     RouteSpec[]
//!     → route.rs (split pattern, literal / :param segments)
//!     → table.rs (append to the router for the descriptor's method)
//!     → Frozen RouterTable, shared via Arc
//! ```
//!
//! # Design Decisions
//! - Routes compiled at configuration time, immutable at runtime
//! - No regex or wildcards, only literal and named segments
//! - Deterministic: first registered route wins, no specificity ranking
//! - Bad patterns fail before any request is served

pub mod method_router;
pub mod route;
pub mod table;

pub use method_router::{MethodRouter, RouteMatch};
pub use route::{Params, Route, RouteError, RouteSpec, Segment};
pub use table::{InvalidMethod, MethodKey, RouterTable};
