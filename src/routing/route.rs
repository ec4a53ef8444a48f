//! Route pattern compilation and matching.
//!
//! # Responsibilities
//! - Compile a path template (`/cars/:carId`) into segments
//! - Match a concrete request path structurally
//! - Bind `:name` segments to the raw candidate text
//! - Render a concrete path back from parameters
//!
//! # Design Decisions
//! - Empty segments are ignored on both sides, so `/` has zero segments
//!   and a trailing slash does not change the shape of a path
//! - Matching is exact and case-sensitive; no prefix or partial matches
//! - Parameter values are not percent-decoded
//! - Rendering with a missing parameter is an error, never a guess

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::dispatch::handler::{BoxFuture, Handler};
use crate::dispatch::RequestContext;
use crate::routing::table::MethodKey;

/// Errors raised while compiling or rendering a route.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// The pattern was the empty string.
    #[error("route pattern must not be empty")]
    EmptyPattern,

    /// The pattern did not start with `/`.
    #[error("route pattern `{0}` must start with '/'")]
    MissingLeadingSlash(String),

    /// A segment consisted of a bare `:`.
    #[error("route pattern `{0}` contains a parameter segment without a name")]
    UnnamedParameter(String),

    /// The same parameter name appeared twice.
    #[error("route pattern `{pattern}` declares parameter `{name}` more than once")]
    DuplicateParameter { pattern: String, name: String },

    /// `render` was called without a value for a parameter.
    #[error("no value supplied for parameter `{name}` of route `{pattern}`")]
    MissingParameter { pattern: String, name: String },
}

/// One compiled piece of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the candidate segment byte for byte.
    Literal(String),
    /// Matches any segment and binds it under this name.
    Param(String),
}

/// Path parameters bound during a match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: HashMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// Route descriptor accepted at configuration time.
///
/// A bare `&str` converts into a descriptor for the wildcard method with no
/// hooks and no handler.
#[derive(Clone)]
pub struct RouteSpec {
    pub(crate) path: String,
    pub(crate) method: MethodKey,
    pub(crate) before: Vec<Arc<dyn Handler>>,
    pub(crate) handler: Option<Arc<dyn Handler>>,
}

impl RouteSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: MethodKey::Any,
            before: Vec::new(),
            handler: None,
        }
    }

    /// Restrict the route to one method. Defaults to any method.
    pub fn method(mut self, method: impl Into<MethodKey>) -> Self {
        self.method = method.into();
        self
    }

    /// Append a route-local hook. Hooks run in the order they are added.
    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, ()> + Send + Sync + 'static,
    {
        self.before.push(Arc::new(hook));
        self
    }

    /// Append an already boxed hook.
    pub fn before_handler(mut self, hook: Arc<dyn Handler>) -> Self {
        self.before.push(hook);
        self
    }

    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, ()> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method_key(&self) -> &MethodKey {
        &self.method
    }
}

impl fmt::Debug for RouteSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteSpec")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("before", &self.before.len())
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

impl From<&str> for RouteSpec {
    fn from(path: &str) -> Self {
        RouteSpec::new(path)
    }
}

impl From<String> for RouteSpec {
    fn from(path: String) -> Self {
        RouteSpec::new(path)
    }
}

/// A compiled route.
#[derive(Clone)]
pub struct Route {
    pattern: String,
    segments: Vec<Segment>,
    before: Vec<Arc<dyn Handler>>,
    handler: Option<Arc<dyn Handler>>,
}

impl Route {
    /// Compile a descriptor.
    pub fn compile(spec: RouteSpec) -> Result<Self, RouteError> {
        let segments = parse_pattern(&spec.path)?;
        Ok(Self {
            pattern: spec.path,
            segments,
            before: spec.before,
            handler: spec.handler,
        })
    }

    /// Compile a bare pattern with no hooks and no handler.
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        Self::compile(RouteSpec::new(pattern))
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Route-local hooks in declaration order.
    pub fn before(&self) -> &[Arc<dyn Handler>] {
        &self.before
    }

    pub fn handler(&self) -> Option<&Arc<dyn Handler>> {
        self.handler.as_ref()
    }

    /// Names of the parameter segments, in pattern order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match a request path, returning the bound parameters.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let candidate: Vec<&str> = split_path(path).collect();
        if candidate.len() != self.segments.len() {
            return None;
        }

        let mut params = Params::new();
        for (segment, value) in self.segments.iter().zip(candidate) {
            match segment {
                Segment::Literal(expected) if expected != value => return None,
                Segment::Literal(_) => {}
                Segment::Param(name) => params.insert(name.as_str(), value),
            }
        }
        Some(params)
    }

    /// Build a concrete path by substituting `params` into the pattern.
    pub fn render(&self, params: &Params) -> Result<String, RouteError> {
        if self.segments.is_empty() {
            return Ok("/".to_string());
        }

        let mut path = String::with_capacity(self.pattern.len());
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Param(name) => {
                    let value = params.get(name).ok_or_else(|| RouteError::MissingParameter {
                        pattern: self.pattern.clone(),
                        name: name.clone(),
                    })?;
                    path.push_str(value);
                }
            }
        }
        Ok(path)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("segments", &self.segments)
            .field("before", &self.before.len())
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn parse_pattern(pattern: &str) -> Result<Vec<Segment>, RouteError> {
    if pattern.is_empty() {
        return Err(RouteError::EmptyPattern);
    }
    if !pattern.starts_with('/') {
        return Err(RouteError::MissingLeadingSlash(pattern.to_string()));
    }

    let mut segments = Vec::new();
    for raw in split_path(pattern) {
        let segment = match raw.strip_prefix(':') {
            Some("") => return Err(RouteError::UnnamedParameter(pattern.to_string())),
            Some(name) => {
                let duplicate = segments
                    .iter()
                    .any(|s| matches!(s, Segment::Param(existing) if existing == name));
                if duplicate {
                    return Err(RouteError::DuplicateParameter {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                    });
                }
                Segment::Param(name.to_string())
            }
            None => Segment::Literal(raw.to_string()),
        };
        segments.push(segment);
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_segments() {
        let route = Route::parse("/cars/:carId/wheels").unwrap();
        assert_eq!(
            route.segments(),
            &[
                Segment::Literal("cars".into()),
                Segment::Param("carId".into()),
                Segment::Literal("wheels".into()),
            ]
        );
        assert_eq!(route.param_names().collect::<Vec<_>>(), vec!["carId"]);
        assert_eq!(route.to_string(), "/cars/:carId/wheels");
    }

    #[test]
    fn test_compile_rejects_malformed() {
        assert_eq!(Route::parse("").unwrap_err(), RouteError::EmptyPattern);
        assert!(matches!(
            Route::parse("cars").unwrap_err(),
            RouteError::MissingLeadingSlash(_)
        ));
        assert!(matches!(
            Route::parse("/cars/:").unwrap_err(),
            RouteError::UnnamedParameter(_)
        ));
        assert!(matches!(
            Route::parse("/a/:id/b/:id").unwrap_err(),
            RouteError::DuplicateParameter { .. }
        ));
    }

    #[test]
    fn test_root_route() {
        let route = Route::parse("/").unwrap();
        assert!(route.segments().is_empty());
        assert!(route.matches("/").is_some());
        assert!(route.matches("/cars").is_none());
        assert_eq!(route.render(&Params::new()).unwrap(), "/");
    }

    #[test]
    fn test_match_binds_params() {
        let route = Route::parse("/cars/:carId").unwrap();

        let params = route.matches("/cars/123").unwrap();
        assert_eq!(params.get("carId"), Some("123"));
        assert_eq!(route.render(&params).unwrap(), "/cars/123");

        // Raw value, no decoding
        let params = route.matches("/cars/a%20b").unwrap();
        assert_eq!(params.get("carId"), Some("a%20b"));
    }

    #[test]
    fn test_match_is_structural() {
        let route = Route::parse("/cars").unwrap();
        assert!(route.matches("/cars").is_some());
        assert!(route.matches("/cars/").is_some());
        assert!(route.matches("/Cars").is_none());
        assert!(route.matches("/cars/123/bad").is_none());
        assert!(route.matches("/").is_none());
    }

    #[test]
    fn test_render_missing_param() {
        let route = Route::parse("/cars/:carId").unwrap();
        let err = route.render(&Params::new()).unwrap_err();
        assert_eq!(
            err,
            RouteError::MissingParameter {
                pattern: "/cars/:carId".into(),
                name: "carId".into(),
            }
        );
    }

    #[test]
    fn test_literal_with_colon_inside() {
        let route = Route::parse("/time/12:30").unwrap();
        assert_eq!(route.segments()[1], Segment::Literal("12:30".into()));
        assert!(route.matches("/time/12:30").is_some());
    }
}
