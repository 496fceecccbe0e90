//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! gateway.yaml  → loader.rs → schema.rs structs → validation.rs
//! routing.yaml  → loader.rs → RoutingFileConfig → routing + middleware
//!                                                  (validated at startup)
//! ```
//!
//! # Design Decisions
//! - Parsed once at startup; immutable afterwards (no hot reload)
//! - Fail fast: invalid config aborts boot with exit code 1
//! - Middleware option bags stay free-form here; the factory validates them

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_routing_config, ConfigError};
pub use schema::{
    AdminConfig, BackendConfig, GatewayConfig, JwtConfig, LoggingConfig, MiddlewareConfig,
    RedisConfig, RouteConfig, RoutingConfig, RoutingFileConfig, ServerConfig,
};
