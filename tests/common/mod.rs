//! Shared helpers for dispatcher and server tests.

#![allow(dead_code)]

use std::convert::Infallible;

use axum::body::Body;
use axum::http::{Method, Request};
use futures_util::stream;

/// Request with an empty body.
pub fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Request whose body arrives as separate chunks, like a slow client.
pub fn chunked_request(method: Method, uri: &str, chunks: Vec<&'static str>) -> Request<Body> {
    let body = Body::from_stream(stream::iter(chunks.into_iter().map(Ok::<_, Infallible>)));
    Request::builder()
        .method(method)
        .uri(uri)
        .body(body)
        .unwrap()
}

/// Flag set by the global hook.
#[derive(Clone, Debug, PartialEq)]
pub struct BeforeInvoked;

/// Flag set by a route-local hook.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteBeforeInvoked;
