//! Backend pool management.
//!
//! # Responsibilities
//! - Hold all registered backends in registration order
//! - Publish the healthy subset as an atomic snapshot once per health cycle
//! - Select the next backend round-robin for each dispatch
//!
//! # Design Decisions
//! - The healthy set is an immutable snapshot swapped wholesale (`ArcSwap`),
//!   so a dispatch at any instant sees either the fully-old or fully-new
//!   pool, never a mix
//! - The round-robin cursor is a separate atomic ticket counter; the modulus
//!   is taken against the snapshot length at selection time, which tolerates
//!   the pool shrinking or growing between selections

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use thiserror::Error;

use crate::balancer::backend::{Backend, HealthState};
use crate::config::validation::ValidationError;
use crate::config::BackendConfig;

/// No backend is currently healthy. Maps to a 503 at the dispatch surface.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("no healthy backends available")]
pub struct PoolEmpty;

/// Point-in-time statistics for one backend.
#[derive(Debug, Clone)]
pub struct BackendStats {
    pub name: String,
    pub url: String,
    pub served: u64,
    pub state: HealthState,
}

/// The backend registry plus the published healthy snapshot.
#[derive(Debug)]
pub struct BackendPool {
    /// All registered backends, in registration order. Immutable.
    backends: Vec<Arc<Backend>>,
    /// The currently healthy subset, in registration order. Replaced
    /// wholesale at the end of every health-check cycle.
    healthy: ArcSwap<Vec<Arc<Backend>>>,
    /// Round-robin ticket counter.
    cursor: AtomicUsize,
}

impl BackendPool {
    /// Build the pool from configuration. The healthy snapshot starts empty;
    /// the initial health-check cycle populates it.
    pub fn from_config(configs: &[BackendConfig]) -> Result<Self, ValidationError> {
        let mut backends = Vec::with_capacity(configs.len());
        for config in configs {
            backends.push(Arc::new(Backend::from_config(config)?));
        }
        Ok(Self::new(backends))
    }

    /// Build the pool from already-constructed backends.
    pub fn new(backends: Vec<Arc<Backend>>) -> Self {
        Self {
            backends,
            healthy: ArcSwap::from_pointee(Vec::new()),
            cursor: AtomicUsize::new(0),
        }
    }

    /// All registered backends, in registration order.
    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    /// Atomically replace the healthy snapshot.
    /// Called only by the health monitor, once per cycle.
    pub fn publish_healthy(&self, healthy: Vec<Arc<Backend>>) {
        self.healthy.store(Arc::new(healthy));
    }

    /// Number of backends in the current healthy snapshot.
    pub fn healthy_count(&self) -> usize {
        self.healthy.load().len()
    }

    /// Select the next healthy backend round-robin.
    ///
    /// Takes one ticket from the cursor and indexes the current snapshot
    /// modulo its length. For a pool of size N held constant, N consecutive
    /// calls return each backend exactly once, in registration order.
    pub fn select_next(&self) -> Result<Arc<Backend>, PoolEmpty> {
        let snapshot = self.healthy.load();
        if snapshot.is_empty() {
            return Err(PoolEmpty);
        }
        let ticket = self.cursor.fetch_add(1, Ordering::Relaxed);
        Ok(snapshot[ticket % snapshot.len()].clone())
    }

    /// Per-backend statistics for reporting.
    pub fn stats(&self) -> Vec<BackendStats> {
        self.backends
            .iter()
            .map(|b| BackendStats {
                name: b.name.clone(),
                url: b.url.to_string(),
                served: b.served(),
                state: b.state(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn pool_of(n: usize) -> BackendPool {
        let backends = (0..n)
            .map(|i| {
                let url = Url::parse(&format!("http://127.0.0.1:{}", 8081 + i)).unwrap();
                Arc::new(Backend::new(format!("b{}", i + 1), url))
            })
            .collect();
        BackendPool::new(backends)
    }

    fn publish_all(pool: &BackendPool) {
        pool.publish_healthy(pool.backends().to_vec());
    }

    #[test]
    fn test_empty_pool_returns_pool_empty() {
        let pool = pool_of(3);
        assert_eq!(pool.select_next().unwrap_err(), PoolEmpty);
        assert_eq!(pool.healthy_count(), 0);
    }

    #[test]
    fn test_round_robin_fairness() {
        let pool = pool_of(3);
        publish_all(&pool);

        let names: Vec<String> = (0..3)
            .map(|_| pool.select_next().unwrap().name.clone())
            .collect();
        assert_eq!(names, vec!["b1", "b2", "b3"]);

        // The (N+1)-th selection wraps back to the first.
        assert_eq!(pool.select_next().unwrap().name, "b1");
    }

    #[test]
    fn test_selection_survives_pool_shrink() {
        let pool = pool_of(3);
        publish_all(&pool);

        // Advance the cursor past the length of the shrunken pool.
        for _ in 0..5 {
            pool.select_next().unwrap();
        }

        pool.publish_healthy(vec![pool.backends()[0].clone()]);
        for _ in 0..4 {
            assert_eq!(pool.select_next().unwrap().name, "b1");
        }
    }

    #[test]
    fn test_publish_replaces_wholesale() {
        let pool = pool_of(3);
        publish_all(&pool);
        assert_eq!(pool.healthy_count(), 3);

        pool.publish_healthy(vec![
            pool.backends()[0].clone(),
            pool.backends()[2].clone(),
        ]);
        assert_eq!(pool.healthy_count(), 2);

        // Only b1 and b3 are ever selected.
        for _ in 0..6 {
            let chosen = pool.select_next().unwrap();
            assert_ne!(chosen.name, "b2");
        }
    }

    #[test]
    fn test_concurrent_select_during_publish() {
        let pool = Arc::new(pool_of(4));
        publish_all(&pool);

        let selector = {
            let pool = pool.clone();
            std::thread::spawn(move || {
                for _ in 0..10_000 {
                    // Must never panic or misindex, whatever the publisher does.
                    if let Ok(backend) = pool.select_next() {
                        assert!(!backend.name.is_empty());
                    }
                }
            })
        };

        let publisher = {
            let pool = pool.clone();
            std::thread::spawn(move || {
                for i in 0..1_000 {
                    let size = i % 4;
                    pool.publish_healthy(pool.backends()[..size].to_vec());
                }
            })
        };

        selector.join().unwrap();
        publisher.join().unwrap();
    }

    #[test]
    fn test_from_config_preserves_registration_order() {
        let configs: Vec<BackendConfig> = (0..3)
            .map(|i| BackendConfig {
                name: format!("b{}", i + 1),
                url: format!("http://127.0.0.1:{}", 8081 + i),
            })
            .collect();
        let pool = BackendPool::from_config(&configs).unwrap();
        let names: Vec<&str> = pool.backends().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["b1", "b2", "b3"]);
    }
}
