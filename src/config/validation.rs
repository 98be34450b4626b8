//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check backend URLs are usable (http scheme, host present)
//! - Validate value ranges (intervals and timeouts > 0)
//! - Detect duplicate backends
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::BalancerConfig;

/// A single semantic configuration error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("no backends configured")]
    NoBackends,

    #[error("backend `{name}`: invalid url `{url}`: {reason}")]
    InvalidBackendUrl {
        name: String,
        url: String,
        reason: String,
    },

    #[error("duplicate backend url `{url}`")]
    DuplicateBackendUrl { url: String },

    #[error("duplicate backend name `{name}`")]
    DuplicateBackendName { name: String },

    #[error("invalid listener bind address `{address}`: {reason}")]
    InvalidBindAddress { address: String, reason: String },

    #[error("health check interval must be at least 1 second")]
    InvalidHealthCheckInterval,

    #[error("health check timeout must be at least 1 second")]
    InvalidHealthCheckTimeout,

    #[error("health check path `{path}` must start with `/`")]
    InvalidHealthCheckPath { path: String },

    #[error("invalid metrics address `{address}`: {reason}")]
    InvalidMetricsAddress { address: String, reason: String },
}

/// Validate a configuration, collecting every semantic error found.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    let mut seen_urls = HashSet::new();
    let mut seen_names = HashSet::new();
    for backend in &config.backends {
        match Url::parse(&backend.url) {
            Ok(url) => {
                if url.scheme() != "http" {
                    errors.push(ValidationError::InvalidBackendUrl {
                        name: backend.name.clone(),
                        url: backend.url.clone(),
                        reason: format!("unsupported scheme `{}`", url.scheme()),
                    });
                } else if url.host_str().is_none() {
                    errors.push(ValidationError::InvalidBackendUrl {
                        name: backend.name.clone(),
                        url: backend.url.clone(),
                        reason: "missing host".to_string(),
                    });
                }
            }
            Err(e) => {
                errors.push(ValidationError::InvalidBackendUrl {
                    name: backend.name.clone(),
                    url: backend.url.clone(),
                    reason: e.to_string(),
                });
            }
        }

        if !seen_urls.insert(backend.url.clone()) {
            errors.push(ValidationError::DuplicateBackendUrl {
                url: backend.url.clone(),
            });
        }
        if !seen_names.insert(backend.name.clone()) {
            errors.push(ValidationError::DuplicateBackendName {
                name: backend.name.clone(),
            });
        }
    }

    if let Err(e) = config.listener.bind_address.parse::<SocketAddr>() {
        errors.push(ValidationError::InvalidBindAddress {
            address: config.listener.bind_address.clone(),
            reason: e.to_string(),
        });
    }

    if config.health_check.interval_secs == 0 {
        errors.push(ValidationError::InvalidHealthCheckInterval);
    }
    if config.health_check.timeout_secs == 0 {
        errors.push(ValidationError::InvalidHealthCheckTimeout);
    }
    if !config.health_check.path.starts_with('/') {
        errors.push(ValidationError::InvalidHealthCheckPath {
            path: config.health_check.path.clone(),
        });
    }

    if config.observability.metrics_enabled {
        if let Err(e) = config.observability.metrics_address.parse::<SocketAddr>() {
            errors.push(ValidationError::InvalidMetricsAddress {
                address: config.observability.metrics_address.clone(),
                reason: e.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
