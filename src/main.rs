//! Load balancer entry point.
//!
//! Startup order: configuration (fatal on error), logging, metrics,
//! listener, signal handler, then the server itself — which runs one eager
//! health-check cycle before accepting traffic. After shutdown, final
//! per-backend statistics are reported.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use load_balancer::config::load_config;
use load_balancer::http::HttpServer;
use load_balancer::lifecycle::{signals, Shutdown};
use load_balancer::observability::{logging, metrics};

/// Round-robin HTTP load balancer.
#[derive(Debug, Parser)]
#[command(name = "load-balancer", version, about)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "balancer.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let config = load_config(&args.config)?;

    logging::init(&config.observability.log_level);

    tracing::info!(
        config = %args.config.display(),
        bind_address = %config.listener.bind_address,
        backends = config.backends.len(),
        health_check_interval_secs = config.health_check.interval_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            signals::wait_for_signal().await;
            shutdown.trigger();
        });
    }

    let server = HttpServer::new(config)?;
    let pool = server.pool();

    server.run(listener, shutdown.token()).await?;

    for stats in pool.stats() {
        tracing::info!(
            backend = %stats.name,
            url = %stats.url,
            served = stats.served,
            status = ?stats.state,
            "Final backend statistics"
        );
    }
    tracing::info!("Shutdown complete");

    Ok(())
}
