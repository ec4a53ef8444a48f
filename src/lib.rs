//! REST request routing and dispatch library.
//!
//! Maps `(method, path)` to a handler through `:param` route patterns,
//! runs global and route-local before hooks, and turns `send` / `error`
//! into HTTP responses.

pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::ServerConfig;
pub use dispatch::{BodyError, HandlerConfig, Payload, Phase, RequestContext, RestHandler};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{MethodKey, MethodRouter, Route, RouteError, RouteSpec, RouterTable};
