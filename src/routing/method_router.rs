//! Ordered route list for a single method.
//!
//! # Responsibilities
//! - Keep routes in declaration order
//! - First structural match wins
//!
//! # Design Decisions
//! - Routes are held as `Arc<Route>` so cloning a router (copy-on-write
//!   table updates) never recompiles patterns
//! - O(n) scan; segment-count mismatch rejects most candidates early

use std::sync::Arc;

use crate::routing::route::{Params, Route};

/// A successful lookup.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    pub params: Params,
}

/// Routes registered for one method key.
#[derive(Debug, Clone, Default)]
pub struct MethodRouter {
    routes: Vec<Arc<Route>>,
}

impl MethodRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. Later routes lose ties against earlier ones.
    pub fn add_route(&mut self, route: impl Into<Arc<Route>>) {
        self.routes.push(route.into());
    }

    /// Find the first route that structurally matches `path`.
    pub fn find_route(&self, path: &str) -> Option<RouteMatch> {
        self.routes.iter().find_map(|route| {
            route.matches(path).map(|params| RouteMatch {
                route: Arc::clone(route),
                params,
            })
        })
    }

    /// Routes in declaration order.
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Remove every route. The router stays usable for new registrations.
    pub fn reset(&mut self) {
        self.routes.clear();
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
