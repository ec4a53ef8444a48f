//! HTTP server setup.
//!
//! # Responsibilities
//! - Create an axum Router whose fallback feeds every request to the
//!   dispatcher
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Serve a listener until shutdown is signalled
//!
//! # Design Decisions
//! - axum does no routing of its own here; `RestHandler` owns it
//! - A request left unresolved by a hook or handler is never answered by
//!   the dispatcher; the timeout layer replies 408 at the deadline

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::dispatch::RestHandler;

/// HTTP front end for a `RestHandler`.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    handler: Arc<RestHandler>,
}

impl HttpServer {
    pub fn new(config: ServerConfig, handler: Arc<RestHandler>) -> Self {
        let router = Self::build_router(&config, Arc::clone(&handler));
        Self {
            router,
            config,
            handler,
        }
    }

    /// Build the axum router with all middleware layers.
    ///
    /// The body limit must wrap the timeout; `TimeoutLayer` requires a
    /// `Default` response body.
    fn build_router(config: &ServerConfig, handler: Arc<RestHandler>) -> Router {
        Router::new()
            .fallback(dispatch_request)
            .with_state(handler)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
                    .layer(TimeoutLayer::with_status_code(
                        StatusCode::REQUEST_TIMEOUT,
                        Duration::from_secs(config.timeouts.request_secs),
                    )),
            )
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn handler(&self) -> &Arc<RestHandler> {
        &self.handler
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve `listener` until `shutdown` fires, then drain and return.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.handler.routes().route_count(),
            request_timeout_secs = self.config.timeouts.request_secs,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn dispatch_request(
    State(handler): State<Arc<RestHandler>>,
    request: Request<Body>,
) -> Response {
    let rest = handler.handle(request).await;
    match rest.into_response() {
        Some(response) => response,
        None => std::future::pending().await,
    }
}
