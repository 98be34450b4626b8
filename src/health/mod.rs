//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer (plus one eager cycle at startup)
//!     → Probe each backend concurrently
//!     → Reconcile outcomes per state.rs
//!     → Publish rebuilt healthy snapshot to the pool
//!
//! State machine (state.rs):
//!     Unknown → Healthy ←→ Unhealthy
//! ```
//!
//! # Design Decisions
//! - One probe per backend per cycle, no retries inside a probe
//! - A slow backend never delays detection of the others (concurrent fan-out,
//!   bounded by the per-probe timeout)
//! - Forwarding failures never mutate health state; only probes do

pub mod active;
pub mod state;

pub use active::HealthMonitor;
