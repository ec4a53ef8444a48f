//! Request body accumulation.

use axum::body::{Body, Bytes};

/// Errors surfaced by the body accessors of `RequestContext`.
///
/// None of these produce a response on their own; the caller decides.
#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    /// The transport failed or the body exceeded the size limit.
    #[error("failed to read request body: {0}")]
    Read(#[source] axum::Error),

    #[error("request body is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("request body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A previous read failed and consumed the stream.
    #[error("request body is unavailable after an earlier read failure")]
    Unavailable,
}

/// Body stream that is drained at most once and then served from memory.
#[derive(Debug)]
pub(crate) enum RequestBody {
    Pending(Body),
    Buffered(Bytes),
    Failed,
}

impl RequestBody {
    pub(crate) fn new(body: Body) -> Self {
        RequestBody::Pending(body)
    }

    /// Collect every chunk until end of stream, or return the cached bytes.
    pub(crate) async fn bytes(&mut self, limit: usize) -> Result<Bytes, BodyError> {
        match std::mem::replace(self, RequestBody::Failed) {
            RequestBody::Pending(body) => {
                let bytes = axum::body::to_bytes(body, limit)
                    .await
                    .map_err(BodyError::Read)?;
                tracing::trace!(bytes = bytes.len(), "Request body buffered");
                *self = RequestBody::Buffered(bytes.clone());
                Ok(bytes)
            }
            RequestBody::Buffered(bytes) => {
                *self = RequestBody::Buffered(bytes.clone());
                Ok(bytes)
            }
            RequestBody::Failed => Err(BodyError::Unavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use std::convert::Infallible;

    fn chunked(chunks: Vec<&'static str>) -> Body {
        Body::from_stream(stream::iter(chunks.into_iter().map(Ok::<_, Infallible>)))
    }

    #[tokio::test]
    async fn test_accumulates_chunks_once() {
        let mut body = RequestBody::new(chunked(vec!["this ", "is ", "a ", "test"]));
        let first = body.bytes(1024).await.unwrap();
        assert_eq!(&first[..], b"this is a test");

        let second = body.bytes(1024).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_limit_exceeded() {
        let mut body = RequestBody::new(chunked(vec!["0123456789", "0123456789"]));
        assert!(matches!(body.bytes(8).await, Err(BodyError::Read(_))));
        assert!(matches!(body.bytes(8).await, Err(BodyError::Unavailable)));
    }
}
