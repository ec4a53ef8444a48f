//! Method-keyed route table.
//!
//! # Responsibilities
//! - Map each method (and the `*` wildcard) to a `MethodRouter`
//! - Resolve a request method, falling back to the wildcard
//!
//! # Design Decisions
//! - Cheap to clone: routers hold `Arc<Route>`, so the dispatcher can
//!   replace the whole table on every configuration change
//! - "No router" and "no route" are distinct outcomes for callers

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use axum::http::Method;

use crate::routing::method_router::{MethodRouter, RouteMatch};
use crate::routing::route::{Route, RouteError, RouteSpec};

/// Key of a `MethodRouter` inside a `RouterTable`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum MethodKey {
    /// The `*` wildcard router, used when no exact router exists.
    #[default]
    Any,
    Exact(Method),
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodKey::Any => f.write_str("*"),
            MethodKey::Exact(method) => f.write_str(method.as_str()),
        }
    }
}

impl From<Method> for MethodKey {
    fn from(method: Method) -> Self {
        MethodKey::Exact(method)
    }
}

impl From<&Method> for MethodKey {
    fn from(method: &Method) -> Self {
        MethodKey::Exact(method.clone())
    }
}

/// Error for method names that are not valid HTTP tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid HTTP method `{0}`")]
pub struct InvalidMethod(pub String);

impl FromStr for MethodKey {
    type Err = InvalidMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "*" {
            return Ok(MethodKey::Any);
        }
        Method::from_bytes(s.to_ascii_uppercase().as_bytes())
            .map(MethodKey::Exact)
            .map_err(|_| InvalidMethod(s.to_string()))
    }
}

/// All method routers of a dispatcher.
#[derive(Debug, Clone, Default)]
pub struct RouterTable {
    by_method: HashMap<MethodKey, MethodRouter>,
}

impl RouterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router for `method`, else the wildcard router, else `None`.
    pub fn resolve(&self, method: &Method) -> Option<&MethodRouter> {
        self.by_method
            .get(&MethodKey::Exact(method.clone()))
            .or_else(|| self.by_method.get(&MethodKey::Any))
    }

    /// Resolve the method router and look the path up in it.
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.resolve(method)?.find_route(path)
    }

    /// Compile `spec` and append it to the router for its method.
    pub fn register_route(&mut self, spec: RouteSpec) -> Result<(), RouteError> {
        let key = spec.method.clone();
        let route = Route::compile(spec)?;
        self.insert(key, route);
        Ok(())
    }

    /// Append an already compiled route, creating the router if absent.
    pub fn insert(&mut self, key: MethodKey, route: impl Into<std::sync::Arc<Route>>) {
        self.by_method.entry(key).or_default().add_route(route);
    }

    pub fn method_router(&self, key: &MethodKey) -> Option<&MethodRouter> {
        self.by_method.get(key)
    }

    pub fn method_router_mut(&mut self, key: &MethodKey) -> Option<&mut MethodRouter> {
        self.by_method.get_mut(key)
    }

    /// Keys that currently have a router.
    pub fn methods(&self) -> impl Iterator<Item = &MethodKey> {
        self.by_method.keys()
    }

    /// Total number of routes across all methods.
    pub fn route_count(&self) -> usize {
        self.by_method.values().map(MethodRouter::len).sum()
    }
}
