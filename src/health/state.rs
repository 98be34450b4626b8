//! Backend health state machine.
//!
//! # States
//! - Unknown: initial state, before the first probe completes
//! - Healthy: backend is in the published pool and receives traffic
//! - Unhealthy: backend excluded from the published pool
//!
//! # State Transitions
//! ```text
//! Unknown   → Healthy:   probe succeeded
//! Unknown   → Unhealthy: probe failed
//! Healthy   → Unhealthy: probe failed
//! Unhealthy → Healthy:   probe succeeded (served counter reset)
//! ```
//!
//! # Design Decisions
//! - A single probe outcome decides each transition; the probe cadence
//!   itself is the retry mechanism
//! - Self-transitions are no-ops with no observable mutation
//! - The served counter resets exactly on the not-healthy → healthy edge
//! - No terminal state; the machine runs for the backend's whole lifetime
