//! Active health checking.
//!
//! # Responsibilities
//! - Probe all backends concurrently, once per cycle
//! - Reconcile probe outcomes into state transitions
//! - Publish the rebuilt healthy snapshot atomically

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::task::JoinSet;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::balancer::backend::{Backend, HealthState};
use crate::balancer::pool::BackendPool;
use crate::config::HealthCheckConfig;
use crate::observability::metrics;

/// Drives periodic health-check cycles against all registered backends.
pub struct HealthMonitor {
    pool: Arc<BackendPool>,
    config: HealthCheckConfig,
    client: Client<HttpConnector, Body>,
    cancel: CancellationToken,
}

impl HealthMonitor {
    pub fn new(pool: Arc<BackendPool>, config: HealthCheckConfig, cancel: CancellationToken) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            pool,
            config,
            client,
            cancel,
        }
    }

    /// Run the periodic loop until cancelled.
    ///
    /// The caller is expected to have already run one eager cycle via
    /// [`run_cycle`](Self::run_cycle) before traffic is accepted; the
    /// interval's immediate first tick is consumed so that cycle is not
    /// repeated. Cycles never overlap: each one is awaited inline and ticks
    /// that land mid-cycle are skipped.
    pub async fn run(self) {
        tracing::info!(
            interval = self.config.interval_secs,
            path = %self.config.path,
            "Health monitor starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
            }
        }
    }

    /// One full reconciliation pass: fan out one probe per backend, fan in,
    /// apply state transitions, then publish the rebuilt healthy snapshot.
    pub async fn run_cycle(&self) {
        let timeout = Duration::from_secs(self.config.timeout_secs);

        let mut probes = JoinSet::new();
        for backend in self.pool.backends() {
            let backend = backend.clone();
            let client = self.client.clone();
            let path = self.config.path.clone();
            let cancel = self.cancel.clone();
            probes.spawn(async move {
                let healthy = probe_backend(&client, &backend, &path, timeout, &cancel).await;
                (backend, healthy)
            });
        }

        let mut outcomes = Vec::with_capacity(probes.len());
        while let Some(res) = probes.join_next().await {
            if let Ok(outcome) = res {
                outcomes.push(outcome);
            }
        }

        for (backend, healthy) in outcomes {
            self.apply_outcome(&backend, healthy);
            metrics::record_backend_health(&backend.name, backend.is_healthy());
        }

        let healthy: Vec<Arc<Backend>> = self
            .pool
            .backends()
            .iter()
            .filter(|b| b.is_healthy())
            .cloned()
            .collect();
        let healthy_count = healthy.len();
        self.pool.publish_healthy(healthy);

        metrics::record_healthy_backends(healthy_count);
        tracing::info!(
            healthy = healthy_count,
            total = self.pool.backends().len(),
            "Health check cycle complete"
        );
    }

    /// Apply one probe outcome to one backend.
    ///
    /// Self-transitions are no-ops; the served counter is reset exactly on
    /// the not-healthy → healthy edge.
    fn apply_outcome(&self, backend: &Backend, healthy: bool) {
        let previous = backend.state();
        match (healthy, previous) {
            (true, HealthState::Healthy) => {}
            (true, _) => {
                backend.set_state(HealthState::Healthy);
                backend.reset_served();
                tracing::info!(backend = %backend.name, url = %backend.url, "Backend became healthy");
            }
            (false, HealthState::Unhealthy) => {}
            (false, _) => {
                backend.set_state(HealthState::Unhealthy);
                tracing::warn!(backend = %backend.name, url = %backend.url, "Backend became unhealthy");
            }
        }
    }
}

/// Issue one liveness probe against one backend.
///
/// Healthy means exactly `200 OK` on the probe path. Timeout, connection
/// error, cancellation, and any other status are all failures; the caller
/// never sees an error.
async fn probe_backend(
    client: &Client<HttpConnector, Body>,
    backend: &Backend,
    path: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> bool {
    let probe_url = match backend.url.join(path) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!(backend = %backend.name, error = %e, "Failed to build probe URL");
            return false;
        }
    };

    let request = match Request::builder()
        .method("GET")
        .uri(probe_url.as_str())
        .header("user-agent", "load-balancer-health-check")
        .body(Body::empty())
    {
        Ok(req) => req,
        Err(e) => {
            tracing::error!(backend = %backend.name, error = %e, "Failed to build probe request");
            return false;
        }
    };

    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!(backend = %backend.name, "Probe cancelled");
            return false;
        }
        res = time::timeout(timeout, client.request(request)) => res,
    };

    match response {
        Ok(Ok(response)) => {
            let healthy = response.status() == StatusCode::OK;
            if !healthy {
                tracing::warn!(
                    backend = %backend.name,
                    status = %response.status(),
                    "Probe failed: unexpected status"
                );
            }
            healthy
        }
        Ok(Err(e)) => {
            tracing::warn!(backend = %backend.name, error = %e, "Probe failed: connection error");
            false
        }
        Err(_) => {
            tracing::warn!(backend = %backend.name, "Probe failed: timeout");
            false
        }
    }
}
