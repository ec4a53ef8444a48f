//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → broadcast to subscribers → server stops accepting
//!     → in-flight requests drain → run() returns
//!
//! Signals (signals.rs):
//!     SIGINT / SIGTERM → Shutdown::trigger()
//! ```
//!
//! # Design Decisions
//! - One broadcast channel; every long-running task subscribes
//! - Signal handling lives in the binary path only; the library never
//!   installs handlers on its own

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
