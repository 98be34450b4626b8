//! Stub backend server for manual end-to-end runs.
//!
//! Answers `/` with a greeting naming its port and `/health` with 200, the
//! contract the balancer's health probes expect.

use std::net::SocketAddr;

use axum::{http::StatusCode, routing::get, Router};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "backend", version, about)]
struct Args {
    /// Port to listen on (loopback only).
    #[arg(short, long, default_value_t = 8081)]
    port: u16,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let port = args.port;

    let app = Router::new()
        .route(
            "/",
            get(move || async move { format!("Hello from backend server {port}") }),
        )
        .route("/health", get(|| async { StatusCode::OK }));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("Backend server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
