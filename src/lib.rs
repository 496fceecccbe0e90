//! Edge API Gateway
//!
//! Terminates client HTTP requests, authenticates and authorizes them
//! against a JWT trust model with server-side revocation, and
//! reverse-proxies survivors to configured backends. Errors surface as
//! RFC 9457 Problem Details.
//!
//! # Architecture Overview
//!
//! ```text
//!   request ─► routing::Router ─► middleware::Chain ─► transport ─► backend
//!                  │                     │                  │
//!                  ▼                     ▼                  ▼
//!            404/405 error         401/403 error      502/504 error
//!                                        │
//!                                        ▼
//!                          http::problem → Problem Details
//! ```
//!
//! Cross-cutting: `config` (YAML, validated at boot), `session` (revocation
//! markers in Redis), `observability` (tracing), `lifecycle` (signals,
//! bounded-drain shutdown).

// Request pipeline
pub mod context;
pub mod middleware;
pub mod routing;
pub mod transport;

// Trust layer
pub mod admin;
pub mod session;

// HTTP surface
pub mod error;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
