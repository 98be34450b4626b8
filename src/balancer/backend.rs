//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend server
//! - Track how many requests the backend has served
//! - Track health state (Unknown/Healthy/Unhealthy)

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use url::Url;

use crate::config::BackendConfig;
use crate::config::validation::ValidationError;

/// Health State enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Unknown = 0,
    Healthy = 1,
    Unhealthy = 2,
}

impl From<u8> for HealthState {
    fn from(val: u8) -> Self {
        match val {
            1 => HealthState::Healthy,
            2 => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }
}

/// A single backend server.
///
/// Health state is written only by the health monitor; the dispatcher and
/// reporting read it. The served counter is incremented by the dispatcher and
/// reset by the health monitor on recovery, so both fields are atomics.
#[derive(Debug)]
pub struct Backend {
    /// Identifier from configuration, used as a logging/metrics label.
    pub name: String,
    /// Base URL of the backend. Immutable after registration.
    pub url: Url,

    /// Requests served since the backend last became healthy.
    served: AtomicU64,
    /// Current health state (0=Unknown, 1=Healthy, 2=Unhealthy).
    state: AtomicU8,
}

impl Backend {
    /// Create a new backend in the `Unknown` state.
    pub fn new(name: impl Into<String>, url: Url) -> Self {
        Self {
            name: name.into(),
            url,
            served: AtomicU64::new(0),
            state: AtomicU8::new(HealthState::Unknown as u8),
        }
    }

    /// Build a backend from its configuration entry.
    pub fn from_config(config: &BackendConfig) -> Result<Self, ValidationError> {
        let url = Url::parse(&config.url).map_err(|e| ValidationError::InvalidBackendUrl {
            name: config.name.clone(),
            url: config.url.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(config.name.clone(), url))
    }

    /// Get the current health state.
    pub fn state(&self) -> HealthState {
        self.state.load(Ordering::Relaxed).into()
    }

    /// Set the health state. Called only by the health monitor.
    pub fn set_state(&self, state: HealthState) {
        self.state.store(state as u8, Ordering::Relaxed);
    }

    /// Return true if the backend is currently `Healthy`.
    pub fn is_healthy(&self) -> bool {
        self.state() == HealthState::Healthy
    }

    /// Requests served since the backend last became healthy.
    pub fn served(&self) -> u64 {
        self.served.load(Ordering::Relaxed)
    }

    /// Record one served request. Touches only the counter, never the state.
    pub fn record_served(&self) {
        self.served.fetch_add(1, Ordering::Relaxed);
    }

    /// Reset the served counter. Called on the not-healthy → healthy edge.
    pub fn reset_served(&self) {
        self.served.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(url: &str) -> Backend {
        Backend::new("test", Url::parse(url).unwrap())
    }

    #[test]
    fn test_initial_state_is_unknown() {
        let b = backend("http://127.0.0.1:8081");
        assert_eq!(b.state(), HealthState::Unknown);
        assert!(!b.is_healthy());
        assert_eq!(b.served(), 0);
    }

    #[test]
    fn test_served_counter() {
        let b = backend("http://127.0.0.1:8081");
        b.record_served();
        b.record_served();
        b.record_served();
        assert_eq!(b.served(), 3);

        b.reset_served();
        assert_eq!(b.served(), 0);
    }

    #[test]
    fn test_state_round_trip() {
        let b = backend("http://127.0.0.1:8081");
        b.set_state(HealthState::Healthy);
        assert!(b.is_healthy());
        b.set_state(HealthState::Unhealthy);
        assert_eq!(b.state(), HealthState::Unhealthy);
        assert!(!b.is_healthy());
    }

    #[test]
    fn test_health_state_from_u8() {
        assert_eq!(HealthState::from(0), HealthState::Unknown);
        assert_eq!(HealthState::from(1), HealthState::Healthy);
        assert_eq!(HealthState::from(2), HealthState::Unhealthy);
        assert_eq!(HealthState::from(42), HealthState::Unknown);
    }

    #[test]
    fn test_from_config_rejects_bad_url() {
        let config = BackendConfig {
            name: "bad".to_string(),
            url: "not a url".to_string(),
        };
        assert!(Backend::from_config(&config).is_err());
    }
}
