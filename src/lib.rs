//! Round-Robin HTTP Load Balancer
//!
//! A single-process HTTP load balancer built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                LOAD BALANCER                  │
//!                        │                                               │
//!     Client Request     │  ┌─────────┐      ┌──────────────────────┐   │
//!     ───────────────────┼─▶│  http   │─────▶│  balancer::pool       │   │
//!                        │  │ server  │      │  (healthy snapshot +  │   │
//!                        │  └─────────┘      │   round-robin cursor) │   │
//!                        │       │           └──────────┬───────────┘   │
//!                        │       │                      │               │
//!     Client Response    │       ▼                      ▼               │
//!     ◀──────────────────┼── forward via ───────▶ chosen backend ───────┼──▶ Backend
//!                        │   shared client                              │    Server
//!                        │                                               │
//!                        │  ┌────────────────────────────────────────┐  │
//!                        │  │ health::active                          │  │
//!                        │  │   periodic cycle: probe all backends    │  │
//!                        │  │   concurrently → reconcile states →     │  │
//!                        │  │   publish new healthy snapshot          │  │
//!                        │  └────────────────────────────────────────┘  │
//!                        │                                               │
//!                        │  config · lifecycle · observability          │
//!                        └──────────────────────────────────────────────┘
//! ```
//!
//! The health-check cycle and the dispatch path share two resources: the
//! healthy-pool snapshot (published atomically once per cycle, read lock-free
//! on every dispatch) and each backend's atomic counters. The dispatcher
//! never observes a partially rebuilt pool.

// Core subsystems
pub mod balancer;
pub mod config;
pub mod http;

// Background health checking
pub mod health;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use balancer::pool::BackendPool;
pub use config::schema::BalancerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
