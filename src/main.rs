//! rest-handler demo server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ axum + tower-http layers ──▶ RestHandler
//!                      (request id, trace,          │
//!                       timeout, body limit)        ▼
//!                                             RouterTable
//!                                          (method → MethodRouter)
//!                                                   │
//!                                                   ▼
//!                                      global hooks → route hooks
//!                                                   │
//!                                                   ▼
//!     Client Response                            handler
//!     ◀────────────── RequestContext::into_response ◀── send / error
//! ```
//!
//! Serves a small built-in route set; real applications build their own
//! `RestHandler` and hand it to `HttpServer`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use clap::Parser;
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;

use rest_handler::config::{load_config, ServerConfig};
use rest_handler::lifecycle::signals::shutdown_on_signal;
use rest_handler::observability::{logging::init_logging, metrics::init_metrics};
use rest_handler::{HandlerConfig, HttpServer, RestHandler, RouteError, RouteSpec, Shutdown};

#[derive(Parser)]
#[command(name = "rest-handler")]
#[command(about = "Serve the built-in demo routes through the REST dispatcher", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "rest-handler starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let handler = Arc::new(build_handler(config.limits.max_body_size)?);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    let server = HttpServer::new(config, handler);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_handler(max_body_size: usize) -> Result<RestHandler, RouteError> {
    let config = HandlerConfig::new()
        .max_body_size(max_body_size)
        .route(
            RouteSpec::new("/health")
                .method(Method::GET)
                .handler(|rest| Box::pin(async move {
                    rest.send(json!({
                        "status": "ok",
                        "version": env!("CARGO_PKG_VERSION"),
                    }));
                })),
        )
        .route(
            RouteSpec::new("/echo/params/:value")
                .method(Method::GET)
                .handler(|rest| Box::pin(async move {
                    let params: Map<String, Value> = rest
                        .params()
                        .iter()
                        .map(|(name, value)| (name.to_string(), Value::from(value)))
                        .collect();
                    rest.send(Value::Object(params));
                })),
        )
        .route(
            RouteSpec::new("/echo/body")
                .method(Method::POST)
                .handler(|rest| Box::pin(async move {
                    match rest.body_text().await {
                        Ok(body) => rest.send(body),
                        Err(e) => rest.error_with_status(StatusCode::BAD_REQUEST, e.to_string()),
                    }
                })),
        )
        .route(
            RouteSpec::new("/echo/parsed-body")
                .method(Method::POST)
                .handler(|rest| Box::pin(async move {
                    match rest.parsed_body().await {
                        Ok(body) => rest.send(body),
                        Err(e) => rest.error_with_status(StatusCode::BAD_REQUEST, e.to_string()),
                    }
                })),
        );

    let mut handler = RestHandler::create(config)?;
    handler.before(|rest| Box::pin(async move {
        tracing::debug!(
            request_id = %rest.request_id(),
            route = ?rest.route().map(|r| r.pattern()),
            "Request routed"
        );
        rest.next();
    }));
    Ok(handler)
}
