//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Initialize subsystems → Eager health cycle
//!     → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Cancel token → Stop accepting → Cancel probes
//!     → Await current health cycle → Report final statistics
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
