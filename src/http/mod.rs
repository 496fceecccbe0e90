//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, admin routes, graceful shutdown)
//!     → routing::Router (trie match)
//!     → middleware pipeline (recovery-wrapped chain)
//!     → transport (reverse proxy)
//!     → problem.rs (every non-2xx becomes RFC 9457 Problem Details)
//! ```

pub mod problem;
pub mod server;

pub use problem::{problem_response, ProblemDetails};
pub use server::{AppState, BuildError, GatewayServer, ServeError};
