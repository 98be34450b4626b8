//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router and middleware stack (tracing, timeout,
//!   request ID)
//! - Run the eager initial health-check cycle before accepting traffic
//! - Spawn the periodic health monitor and await it during shutdown
//! - Dispatch each request to the next healthy backend (round-robin)
//! - Map pool-empty to 503 and forwarding failure to 502

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{
        uri::{Authority, Scheme},
        Request, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::balancer::backend::Backend;
use crate::balancer::pool::BackendPool;
use crate::config::validation::ValidationError;
use crate::config::BalancerConfig;
use crate::health::active::HealthMonitor;
use crate::http::request::{RequestIdLayer, X_REQUEST_ID};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<BackendPool>,
    pub client: Client<HttpConnector, Body>,
}

/// HTTP front-end for the load balancer.
pub struct HttpServer {
    router: Router,
    config: BalancerConfig,
    pool: Arc<BackendPool>,
}

impl HttpServer {
    /// Create a new server with the given (already validated) configuration.
    pub fn new(config: BalancerConfig) -> Result<Self, ValidationError> {
        let pool = Arc::new(BackendPool::from_config(&config.backends)?);

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            pool: pool.clone(),
            client,
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            pool,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &BalancerConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// The backend pool, for reporting after shutdown.
    pub fn pool(&self) -> Arc<BackendPool> {
        self.pool.clone()
    }

    /// Run the server until the cancellation token fires.
    ///
    /// One eager health-check cycle completes before the listener starts
    /// serving, so the pool is populated (or known-empty) ahead of traffic.
    /// On shutdown the in-flight health cycle is awaited before returning.
    pub async fn run(
        self,
        listener: TcpListener,
        cancel: CancellationToken,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let monitor = HealthMonitor::new(
            self.pool.clone(),
            self.config.health_check.clone(),
            cancel.child_token(),
        );
        monitor.run_cycle().await;
        tracing::info!(
            healthy = self.pool.healthy_count(),
            "Initial health check complete"
        );
        let monitor_handle = tokio::spawn(monitor.run());

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(cancel.clone().cancelled_owned())
            .await?;

        // No pool mutation after this join: the monitor has observed the
        // cancellation and finished (or aborted) its last cycle.
        let _ = monitor_handle.await;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main dispatch handler.
/// Selects the next healthy backend and forwards the request to it.
async fn dispatch_handler(
    State(state): State<AppState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> impl IntoResponse {
    let start_time = Instant::now();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    tracing::debug!(
        request_id = %request_id,
        client = %client_addr,
        method = %method,
        path = %path,
        "Dispatching request"
    );

    let backend = match state.pool.select_next() {
        Ok(backend) => backend,
        Err(_) => {
            tracing::warn!(request_id = %request_id, "No healthy backends");
            metrics::record_request(&method, 503, "none", start_time);
            return (StatusCode::SERVICE_UNAVAILABLE, "No healthy backends").into_response();
        }
    };

    let (mut parts, body) = request.into_parts();
    match rewrite_uri(&parts.uri, &backend) {
        Ok(uri) => parts.uri = uri,
        Err(reason) => {
            tracing::error!(
                request_id = %request_id,
                backend = %backend.name,
                reason = %reason,
                "Failed to rewrite request URI"
            );
            metrics::record_request(&method, 502, &backend.name, start_time);
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    }
    let upstream_request = Request::from_parts(parts, body);

    match state.client.request(upstream_request).await {
        Ok(response) => {
            backend.record_served();
            let status = response.status();
            metrics::record_request(&method, status.as_u16(), &backend.name, start_time);

            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body)).into_response()
        }
        Err(e) => {
            // A forwarding failure is surfaced to the caller; only the next
            // health-check cycle can remove the backend from selection.
            tracing::error!(
                request_id = %request_id,
                backend = %backend.name,
                error = %e,
                "Upstream error"
            );
            metrics::record_request(&method, 502, &backend.name, start_time);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

/// Point the request URI at the chosen backend, keeping path and query.
fn rewrite_uri(uri: &Uri, backend: &Backend) -> Result<Uri, String> {
    let authority = match (backend.url.host_str(), backend.url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        _ => return Err("backend url has no host".to_string()),
    };

    let mut uri_parts = uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(Authority::from_str(&authority).map_err(|e| e.to_string())?);
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(
            axum::http::uri::PathAndQuery::from_str("/").map_err(|e| e.to_string())?,
        );
    }

    Uri::from_parts(uri_parts).map_err(|e| e.to_string())
}
