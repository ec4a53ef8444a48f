//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher and server produce:
//!     → logging.rs (structured tracing events, one span per request)
//!     → metrics.rs (request counters and latency histograms)
//!
//! Consumers:
//!     → stdout via tracing-subscriber fmt layer
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID is a field on every dispatch event
//! - Metrics without an installed recorder are no-ops, so library users
//!   and tests pay nothing
//! - Log level comes from `RUST_LOG` first, then the config file

pub mod logging;
pub mod metrics;
