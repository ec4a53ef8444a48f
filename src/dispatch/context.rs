//! Per-request context handed to hooks and handlers.
//!
//! # Responsibilities
//! - Expose the request (method, path, headers), bound params and route
//! - Carry request-scoped state between pipeline steps (typed extensions)
//! - Provide the control operations: `next`, `send`, `error`
//! - Buffer and decode the request body on demand
//!
//! # Design Decisions
//! - `send` and `error` are terminal; the first one wins and later calls
//!   are logged and ignored
//! - `next` only marks the current hook as done; the dispatcher advances
//! - Body reads suspend the caller until the stream ends

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap, Method, Request, StatusCode};
use axum::response::Response;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::dispatch::body::{BodyError, RequestBody};
use crate::dispatch::reply::{Payload, Reply, TEXT_PLAIN};
use crate::routing::{Params, Route};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Lifecycle stage of a request. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    RouteResolution,
    BeforeChain,
    Handler,
    /// `send` finished the request.
    ResponseSent,
    /// `error` or a not-found short-circuit finished the request.
    Error,
}

/// The `rest` object: request, response and control surface in one place.
#[derive(Debug)]
pub struct RequestContext {
    request_id: String,
    req: Parts,
    body: RequestBody,
    body_limit: usize,
    params: Params,
    route: Option<Arc<Route>>,
    res: Reply,
    extensions: Extensions,
    phase: Phase,
    advanced: bool,
}

impl RequestContext {
    /// Wrap an inbound request. `body_limit` caps body accumulation.
    pub fn new(request: Request<Body>, body_limit: usize) -> Self {
        let (req, body) = request.into_parts();
        let request_id = req
            .headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Self {
            request_id,
            req,
            body: RequestBody::new(body),
            body_limit,
            params: Params::new(),
            route: None,
            res: Reply::new(),
            extensions: Extensions::new(),
            phase: Phase::Start,
            advanced: false,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Request line and headers.
    pub fn req(&self) -> &Parts {
        &self.req
    }

    pub fn method(&self) -> &Method {
        &self.req.method
    }

    /// Path without the query string.
    pub fn path(&self) -> &str {
        self.req.uri.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.req.uri.query()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.req.headers
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// The matched route; `None` when routing failed.
    pub fn route(&self) -> Option<&Arc<Route>> {
        self.route.as_ref()
    }

    pub fn res(&self) -> &Reply {
        &self.res
    }

    pub fn res_mut(&mut self) -> &mut Reply {
        &mut self.res
    }

    /// Set the status a later `send` will use. Ignored once resolved.
    pub fn set_status(&mut self, status: StatusCode) {
        self.res.set_status(status);
    }

    /// Request-scoped state shared between hooks and the handler.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True once `send`, `error` or the not-found path ended the lifecycle.
    pub fn is_resolved(&self) -> bool {
        matches!(self.phase, Phase::ResponseSent | Phase::Error)
    }

    /// Hand control to the next hook, or to the handler after the last one.
    pub fn next(&mut self) {
        if self.is_resolved() {
            tracing::warn!(request_id = %self.request_id, "next() after the response was sent; ignoring");
            return;
        }
        if self.phase != Phase::BeforeChain {
            tracing::debug!(request_id = %self.request_id, phase = ?self.phase, "next() outside the before chain has no effect");
            return;
        }
        self.advanced = true;
    }

    /// Finish with a success payload.
    ///
    /// Text is written as `text/plain`, JSON as `application/json`. The
    /// status is 200 unless one was set earlier.
    pub fn send(&mut self, payload: impl Into<Payload>) {
        if !self.accepts_terminal("send") {
            return;
        }
        let payload = payload.into();
        let status = self.res.explicit_status().unwrap_or(StatusCode::OK);
        let content_type = payload.content_type();
        self.res.finish(status, content_type, payload.into_text());
        self.phase = Phase::ResponseSent;
    }

    /// Serialize `value` as JSON and `send` it.
    pub fn send_json<T: Serialize + ?Sized>(&mut self, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => self.send(Payload::Json(value)),
            Err(e) => {
                tracing::error!(request_id = %self.request_id, error = %e, "Failed to serialize response");
                self.error(format!("Failed to serialize response: {}", e));
            }
        }
    }

    /// Finish with status 500 and a `text/plain` message.
    pub fn error(&mut self, message: impl Into<Payload>) {
        self.error_with_status(StatusCode::INTERNAL_SERVER_ERROR, message);
    }

    /// Finish with `status` and a `text/plain` message. JSON messages are
    /// written in serialized form.
    pub fn error_with_status(&mut self, status: StatusCode, message: impl Into<Payload>) {
        if !self.accepts_terminal("error") {
            return;
        }
        self.res.finish(status, TEXT_PLAIN, message.into().into_text());
        self.phase = Phase::Error;
    }

    /// Raw body bytes, collected until end of stream.
    pub async fn body_bytes(&mut self) -> Result<Bytes, BodyError> {
        self.body.bytes(self.body_limit).await
    }

    /// The full body as text.
    pub async fn body_text(&mut self) -> Result<String, BodyError> {
        let bytes = self.body_bytes().await?;
        Ok(std::str::from_utf8(&bytes)?.to_owned())
    }

    /// The full body parsed as JSON. Parse failures are returned, never
    /// answered automatically.
    pub async fn parsed_body(&mut self) -> Result<Value, BodyError> {
        self.parsed_body_as().await
    }

    pub async fn parsed_body_as<T: DeserializeOwned>(&mut self) -> Result<T, BodyError> {
        let bytes = self.body_bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// The finished response, or `None` if the lifecycle never resolved.
    pub fn into_response(self) -> Option<Response> {
        if !self.is_resolved() {
            return None;
        }
        let mut response = self.res.into_response();
        if let Ok(value) = self.request_id.parse() {
            response.headers_mut().entry(X_REQUEST_ID).or_insert(value);
        }
        Some(response)
    }

    pub(crate) fn enter(&mut self, phase: Phase) {
        tracing::trace!(request_id = %self.request_id, from = ?self.phase, to = ?phase, "Phase change");
        self.phase = phase;
    }

    pub(crate) fn bind(&mut self, route: Arc<Route>, params: Params) {
        self.route = Some(route);
        self.params = params;
    }

    /// Clear the hand-off flag before running a hook.
    pub(crate) fn begin_step(&mut self) {
        self.advanced = false;
    }

    pub(crate) fn advanced(&self) -> bool {
        self.advanced
    }

    pub(crate) fn not_found(&mut self) {
        self.res
            .finish(StatusCode::NOT_FOUND, TEXT_PLAIN, "Not Found".to_string());
        self.phase = Phase::Error;
    }

    fn accepts_terminal(&self, op: &'static str) -> bool {
        if self.is_resolved() {
            tracing::warn!(request_id = %self.request_id, op, "Response already sent; ignoring");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(uri: &str) -> RequestContext {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        RequestContext::new(request, 1024)
    }

    #[test]
    fn test_send_text_and_json() {
        let mut rest = context("/a");
        rest.send("plain");
        assert_eq!(rest.phase(), Phase::ResponseSent);
        assert_eq!(rest.res().header("content-type"), Some("text/plain"));
        assert_eq!(rest.res().body_text(), "plain");

        let mut rest = context("/b");
        rest.send(json!({"_id": "123"}));
        assert_eq!(rest.res().status(), StatusCode::OK);
        assert_eq!(rest.res().header("content-type"), Some("application/json"));
        let body: Value = serde_json::from_slice(rest.res().body()).unwrap();
        assert_eq!(body, json!({"_id": "123"}));
    }

    #[test]
    fn test_send_honours_explicit_status() {
        let mut rest = context("/a");
        rest.set_status(StatusCode::CREATED);
        rest.send_json(&vec![1, 2, 3]);
        assert_eq!(rest.res().status(), StatusCode::CREATED);
        assert_eq!(rest.res().body_text(), "[1,2,3]");
    }

    #[test]
    fn test_error_defaults_to_500() {
        let mut rest = context("/a");
        rest.error("Danger! System overheating.");
        assert_eq!(rest.phase(), Phase::Error);
        assert_eq!(rest.res().status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(rest.res().header("content-type"), Some("text/plain"));
        assert_eq!(rest.res().body_text(), "Danger! System overheating.");

        let mut rest = context("/a");
        rest.error_with_status(StatusCode::BAD_REQUEST, json!({"field": "name"}));
        assert_eq!(rest.res().status(), StatusCode::BAD_REQUEST);
        assert_eq!(rest.res().header("content-type"), Some("text/plain"));
        assert_eq!(rest.res().body_text(), r#"{"field":"name"}"#);
    }

    #[test]
    fn test_first_terminal_wins() {
        let mut rest = context("/a");
        rest.send("first");
        rest.error("second");
        rest.send("third");
        assert_eq!(rest.phase(), Phase::ResponseSent);
        assert_eq!(rest.res().body_text(), "first");
    }

    #[test]
    fn test_send_replaces_raw_writes() {
        let mut rest = context("/a");
        rest.res_mut().write(b"partial");
        rest.send(json!({"a": 1}));
        let body: Value = serde_json::from_slice(rest.res().body()).unwrap();
        assert_eq!(body, json!({"a": 1}));

        let mut rest = context("/a");
        rest.res_mut().end();
        rest.send(json!({"a": 1}));
        assert_eq!(rest.res().header("content-type"), Some("application/json"));
        let body: Value = serde_json::from_slice(rest.res().body()).unwrap();
        assert_eq!(body, json!({"a": 1}));
    }

    #[test]
    fn test_status_frozen_after_send() {
        let mut rest = context("/a");
        rest.send("ok");
        rest.set_status(StatusCode::IM_A_TEAPOT);
        rest.res_mut().write(b" extra");
        assert_eq!(rest.res().status(), StatusCode::OK);
        assert_eq!(rest.res().body_text(), "ok");

        let response = rest.into_response().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_next_only_counts_in_before_chain() {
        let mut rest = context("/a");
        rest.next();
        assert!(!rest.advanced());

        rest.enter(Phase::BeforeChain);
        rest.begin_step();
        rest.next();
        assert!(rest.advanced());
    }

    #[test]
    fn test_request_id_from_header() {
        let request = Request::builder()
            .uri("/a?x=1")
            .header(X_REQUEST_ID, "req-42")
            .body(Body::empty())
            .unwrap();
        let mut rest = RequestContext::new(request, 1024);
        assert_eq!(rest.request_id(), "req-42");
        assert_eq!(rest.path(), "/a");
        assert_eq!(rest.query(), Some("x=1"));

        assert!(!context("/a").request_id().is_empty());

        rest.send("ok");
        let response = rest.into_response().unwrap();
        assert_eq!(response.headers()[X_REQUEST_ID], "req-42");
    }

    #[test]
    fn test_unresolved_has_no_response() {
        assert!(context("/a").into_response().is_none());
    }

    #[tokio::test]
    async fn test_parsed_body_error() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/a")
            .body(Body::from("{not json"))
            .unwrap();
        let mut rest = RequestContext::new(request, 1024);
        assert!(matches!(rest.parsed_body().await, Err(BodyError::Json(_))));
        // The raw text is still there
        assert_eq!(rest.body_text().await.unwrap(), "{not json");
        assert!(!rest.is_resolved());
    }
}
