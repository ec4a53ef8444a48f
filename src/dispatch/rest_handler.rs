//! The dispatcher: route resolution, before chain, handler, finalization.
//!
//! # Responsibilities
//! - Own the route table and the global hooks
//! - Run one request lifecycle per `handle` call
//! - Record per-request logs and metrics
//!
//! # Design Decisions
//! - The route table is an immutable snapshot behind `ArcSwap`; runtime
//!   registration and `reset` publish a new table (copy-on-write), so
//!   in-flight requests keep the snapshot they started with
//! - Global hooks run before route hooks, each strictly after the previous
//!   one called `next()`
//! - A step that neither advances nor terminates stalls the request; the
//!   host bounds it (see `http::server`)

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::http::Request;
use tracing::Instrument;

use crate::dispatch::context::{Phase, RequestContext};
use crate::dispatch::handler::{BoxFuture, Handler};
use crate::observability::metrics;
use crate::routing::{MethodKey, MethodRouter, Route, RouteError, RouteMatch, RouteSpec, RouterTable};

/// Default cap on buffered request bodies (2 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Routes and limits used to build a `RestHandler`.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// Route descriptors in declaration (= match priority) order.
    pub routes: Vec<RouteSpec>,
    pub max_body_size: usize,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl HandlerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. Bare strings register under the `*` method.
    pub fn route(mut self, route: impl Into<RouteSpec>) -> Self {
        self.routes.push(route.into());
        self
    }

    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }
}

/// Request dispatcher.
pub struct RestHandler {
    table: ArcSwap<RouterTable>,
    hooks: Vec<Arc<dyn Handler>>,
    max_body_size: usize,
}

impl RestHandler {
    /// An empty dispatcher: every request is a 404 until routes are added.
    pub fn new() -> Self {
        Self {
            table: ArcSwap::from_pointee(RouterTable::new()),
            hooks: Vec::new(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Compile every route in `config`. Fails on the first bad pattern.
    pub fn create(config: HandlerConfig) -> Result<Self, RouteError> {
        let mut table = RouterTable::new();
        for spec in config.routes {
            table.register_route(spec)?;
        }

        tracing::debug!(
            routes = table.route_count(),
            max_body_size = config.max_body_size,
            "Route table compiled"
        );

        Ok(Self {
            table: ArcSwap::from_pointee(table),
            hooks: Vec::new(),
            max_body_size: config.max_body_size,
        })
    }

    /// Register a global hook. Global hooks run before route hooks, in
    /// registration order.
    pub fn before<F>(&mut self, hook: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, ()> + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(hook));
        self
    }

    pub fn before_handler(&mut self, hook: Arc<dyn Handler>) -> &mut Self {
        self.hooks.push(hook);
        self
    }

    /// Compile and append one route by publishing a new table.
    pub fn route(&self, spec: impl Into<RouteSpec>) -> Result<(), RouteError> {
        let spec = spec.into();
        let key = spec.method_key().clone();
        let route = Arc::new(Route::compile(spec)?);

        tracing::debug!(method = %key, route = %route, "Registering route");
        self.table.rcu(|current| {
            let mut next = (**current).clone();
            next.insert(key.clone(), Arc::clone(&route));
            next
        });
        Ok(())
    }

    /// Clear the router for `key`. The router stays in the table, empty.
    pub fn reset(&self, key: &MethodKey) {
        tracing::debug!(method = %key, "Resetting method router");
        self.table.rcu(|current| {
            let mut next = (**current).clone();
            if let Some(router) = next.method_router_mut(key) {
                router.reset();
            }
            next
        });
    }

    /// Swap in a complete table.
    pub fn replace_routes(&self, table: RouterTable) {
        tracing::debug!(routes = table.route_count(), "Replacing route table");
        self.table.store(Arc::new(table));
    }

    /// The current table snapshot.
    pub fn routes(&self) -> Arc<RouterTable> {
        self.table.load_full()
    }

    /// A detached copy of the router for `key` from the current snapshot.
    ///
    /// Mutating the copy does not affect dispatch; use [`RestHandler::reset`]
    /// or [`RestHandler::route`] to change live routing.
    pub fn method_router(&self, key: &MethodKey) -> Option<MethodRouter> {
        self.table.load().method_router(key).cloned()
    }

    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    /// Run one full lifecycle and hand back the context for inspection.
    pub async fn handle(&self, request: Request<Body>) -> RequestContext {
        let start = Instant::now();
        let mut rest = RequestContext::new(request, self.max_body_size);

        let span = tracing::debug_span!(
            "dispatch",
            request_id = %rest.request_id(),
            method = %rest.method(),
            path = %rest.path(),
        );
        self.dispatch(&mut rest).instrument(span).await;

        let route = rest.route().map(|r| r.pattern().to_string());
        let route = route.as_deref().unwrap_or("none");
        if rest.is_resolved() {
            tracing::debug!(
                request_id = %rest.request_id(),
                route,
                status = rest.res().status().as_u16(),
                "Request finished"
            );
            metrics::record_request(rest.method().as_str(), rest.res().status().as_u16(), route, start);
        } else {
            metrics::record_unresolved(route);
        }
        rest
    }

    async fn dispatch(&self, rest: &mut RequestContext) {
        rest.enter(Phase::RouteResolution);

        let table = self.table.load_full();
        let Some(RouteMatch { route, params }) = table.find(rest.method(), rest.path()) else {
            tracing::debug!("No route matched");
            metrics::record_not_found();
            rest.not_found();
            return;
        };

        let Some(handler) = route.handler().cloned() else {
            tracing::debug!(route = %route, "Matched route has no handler");
            metrics::record_not_found();
            rest.not_found();
            return;
        };

        rest.bind(Arc::clone(&route), params);
        rest.enter(Phase::BeforeChain);

        for (index, hook) in self.hooks.iter().chain(route.before()).enumerate() {
            rest.begin_step();
            hook.call(rest).await;

            if rest.is_resolved() {
                tracing::debug!(hook = index, "Before hook ended the request");
                return;
            }
            if !rest.advanced() {
                tracing::warn!(
                    hook = index,
                    route = %route,
                    "Before hook returned without next(), send() or error(); request left unresolved"
                );
                return;
            }
        }

        rest.enter(Phase::Handler);
        handler.call(rest).await;

        if !rest.is_resolved() {
            tracing::warn!(
                route = %route,
                "Handler returned without send() or error(); request left unresolved"
            );
        }
    }
}

impl Default for RestHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RestHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestHandler")
            .field("routes", &self.table.load().route_count())
            .field("hooks", &self.hooks.len())
            .field("max_body_size", &self.max_body_size)
            .finish()
    }
}
