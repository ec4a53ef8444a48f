//! Response sink and payload rendering.
//!
//! # Responsibilities
//! - Collect status, headers and body written during dispatch
//! - Render `send` / `error` payloads with the right content type
//! - Convert the finished reply into an axum `Response`
//!
//! # Design Decisions
//! - The handler picks text or JSON explicitly (`Payload`), no runtime
//!   type inspection
//! - An explicitly set status survives a later `send`
//! - Writes after `end()` are dropped
//! - `send` / `error` replace anything written before them and seal the
//!   reply; later status, header and body changes are ignored

use std::borrow::Cow;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use serde_json::Value;

pub const TEXT_PLAIN: &str = "text/plain";
pub const APPLICATION_JSON: &str = "application/json";

/// What a handler hands to `send` or `error`.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Written verbatim as `text/plain`.
    Text(String),
    /// Serialized and written as `application/json` by `send`.
    Json(Value),
}

impl Payload {
    /// The body text: strings verbatim, JSON values serialized.
    pub fn into_text(self) -> String {
        match self {
            Payload::Text(text) => text,
            Payload::Json(value) => value.to_string(),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Payload::Text(_) => TEXT_PLAIN,
            Payload::Json(_) => APPLICATION_JSON,
        }
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

/// The outbound response as seen by hooks and handlers.
#[derive(Debug, Default)]
pub struct Reply {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
    ended: bool,
    sealed: bool,
}

impl Reply {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status; 200 unless one was set.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Status set explicitly by a hook, handler or terminal operation.
    pub fn explicit_status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        if self.rejects("set_status") {
            return;
        }
        self.status = Some(status);
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        if self.rejects("set_header") {
            return;
        }
        self.headers.insert(name, value);
    }

    pub fn write(&mut self, chunk: &[u8]) {
        if self.rejects("write") {
            return;
        }
        if self.ended {
            tracing::warn!(bytes = chunk.len(), "Write after end ignored");
            return;
        }
        self.body.extend_from_slice(chunk);
    }

    pub fn end(&mut self) {
        if self.rejects("end") {
            return;
        }
        self.ended = true;
    }

    /// True once a terminal operation wrote the final response.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Replace the body with `body` under the given status and content
    /// type, then seal the reply.
    pub(crate) fn finish(&mut self, status: StatusCode, content_type: &'static str, body: String) {
        if self.rejects("finish") {
            return;
        }
        self.status = Some(status);
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.body = body.into_bytes();
        self.ended = true;
        self.sealed = true;
    }

    fn rejects(&self, op: &'static str) -> bool {
        if self.sealed {
            tracing::warn!(op, "Response already sent; ignoring");
        }
        self.sealed
    }

    pub fn into_response(self) -> Response {
        let status = self.status();
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_rendering() {
        assert_eq!(Payload::from("hi").into_text(), "hi");
        assert_eq!(Payload::from(json!({"a": 1})).into_text(), r#"{"a":1}"#);
        assert_eq!(Payload::from("hi").content_type(), TEXT_PLAIN);
        assert_eq!(Payload::from(json!([1])).content_type(), APPLICATION_JSON);
    }

    #[test]
    fn test_reply_defaults_and_end() {
        let mut reply = Reply::new();
        assert_eq!(reply.status(), StatusCode::OK);
        assert!(reply.explicit_status().is_none());

        reply.write(b"partial");
        reply.end();
        reply.write(b" dropped");
        assert!(reply.is_ended());
        assert_eq!(reply.body_text(), "partial");

        let response = reply.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_finish_replaces_earlier_writes() {
        let mut reply = Reply::new();
        reply.write(b"partial");
        reply.finish(StatusCode::OK, APPLICATION_JSON, r#"{"a":1}"#.into());
        assert_eq!(reply.body(), br#"{"a":1}"#);

        let mut reply = Reply::new();
        reply.end();
        reply.finish(StatusCode::OK, APPLICATION_JSON, r#"{"a":1}"#.into());
        assert_eq!(reply.body(), br#"{"a":1}"#);
    }

    #[test]
    fn test_sealed_reply_ignores_changes() {
        let mut reply = Reply::new();
        reply.finish(StatusCode::CREATED, TEXT_PLAIN, "done".into());
        assert!(reply.is_sealed());

        reply.set_status(StatusCode::IM_A_TEAPOT);
        reply.set_header(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        reply.write(b" more");
        reply.finish(StatusCode::BAD_REQUEST, TEXT_PLAIN, "again".into());

        assert_eq!(reply.status(), StatusCode::CREATED);
        assert_eq!(reply.header("content-type"), Some(TEXT_PLAIN));
        assert_eq!(reply.body_text(), "done");
    }
}
