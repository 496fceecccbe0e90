//! Configuration schema definitions.
//!
//! Two files drive the gateway: the gateway config (server, logging, redis,
//! jwt, admin) and the routing config (routes with backends and middleware
//! descriptors). All types derive Serde traits for YAML deserialization.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for the gateway process.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server settings (bind address, timeouts).
    pub server: ServerConfig,

    /// Log level and format.
    pub logging: LoggingConfig,

    /// Pointer to the routing config file.
    pub routing: RoutingConfig,

    /// Session store connection. Optional; required when any route uses the
    /// revoke middleware or the admin endpoints are exercised.
    pub redis: Option<RedisConfig>,

    /// JWT verification keys. Optional; required when any route uses the jwt
    /// middleware without skip_validation.
    pub jwt: Option<JwtConfig>,

    /// Admin endpoint settings.
    pub admin: AdminConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Header read deadline in seconds.
    pub read_timeout_secs: u64,

    /// Response write deadline in seconds.
    pub write_timeout_secs: u64,

    /// Drain window for in-flight requests on shutdown.
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            read_timeout_secs: 10,
            write_timeout_secs: 30,
            shutdown_timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    /// Bind address in `host:port` form.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (debug, info, warn, error).
    pub level: String,

    /// Output format: "json" or "text".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Routing settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Path to the routing config file.
    pub config_file: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            config_file: "configs/routing.yaml".to_string(),
        }
    }
}

/// Session store connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    /// Server address, e.g. "127.0.0.1:6379".
    pub host: String,

    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub db: i64,

    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    #[serde(default = "default_redis_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_redis_timeout_secs")]
    pub read_timeout_secs: u64,

    #[serde(default = "default_redis_timeout_secs")]
    pub write_timeout_secs: u64,

    /// Key prefix for revocation markers.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

fn default_pool_size() -> u32 {
    10
}

fn default_redis_timeout_secs() -> u64 {
    5
}

fn default_key_prefix() -> String {
    "revoke:".to_string()
}

/// JWT verification settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JwtConfig {
    /// PEM public key files keyed by `kid`.
    pub public_key_files: HashMap<String, String>,

    /// Skip signature verification. Development only.
    pub skip_validation: bool,

    /// Maximum lifetime of an issued token. Revocation markers carry this
    /// TTL so they outlive every token they can affect, and no longer.
    pub max_token_lifetime_secs: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            public_key_files: HashMap::new(),
            skip_validation: false,
            max_token_lifetime_secs: 36_000,
        }
    }
}

/// Admin endpoint settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Shared secret for the forced-revoke endpoint (X-API-Key header).
    pub api_key: String,

    /// Claim holding the user id in admin-handled tokens.
    pub user_id_claim: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            user_id_claim: "sub".to_string(),
        }
    }
}

/// Routing config file root.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RoutingFileConfig {
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// One declarative route.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Path template: literal segments, `:name` parameters, `*` wildcard.
    pub path: String,

    /// Accepted methods. Empty means all methods.
    #[serde(default)]
    pub methods: Vec<String>,

    /// Logical operation name, used as the RBAC map key.
    #[serde(default)]
    pub operation_id: Option<String>,

    pub backend: BackendConfig,

    #[serde(default)]
    pub middleware: Vec<MiddlewareConfig>,

    /// Load order. Lower priority loads first; dispatch is unaffected.
    #[serde(default)]
    pub priority: i32,
}

/// Backend descriptor for a route.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Absolute URL of the origin, e.g. "http://users-svc:3000/api".
    pub url: String,

    /// Per-request deadline in milliseconds.
    #[serde(default = "default_backend_timeout_ms")]
    pub timeout_ms: u64,

    /// Headers set on every forwarded request.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_backend_timeout_ms() -> u64 {
    30_000
}

/// Middleware descriptor: a type tag plus a free-form option bag.
///
/// The option bag is validated when the middleware factory resolves it at
/// startup, never at first request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MiddlewareConfig {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub config: serde_yaml::Mapping,
}
