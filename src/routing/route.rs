//! Route and match-result types.

use std::collections::HashMap;
use std::time::Duration;

use axum::http::Uri;

use crate::config::{MiddlewareConfig, RouteConfig};

/// A compiled route. Immutable after insertion into the trie.
#[derive(Debug, Clone)]
pub struct Route {
    /// Path template the route was registered under.
    pub path: String,

    /// Accepted methods, uppercased. Empty means all methods.
    pub methods: Vec<String>,

    /// Logical operation name for RBAC lookups.
    pub operation_id: Option<String>,

    pub backend: Backend,

    /// Middleware descriptors in execution order.
    pub middleware: Vec<MiddlewareConfig>,

    /// Load order hint. Does not affect dispatch.
    pub priority: i32,
}

/// Backend descriptor: where and how to forward.
#[derive(Debug, Clone)]
pub struct Backend {
    pub url: Uri,
    pub timeout: Duration,
    pub headers: HashMap<String, String>,
}

/// Result of a successful route match.
#[derive(Debug)]
pub struct MatchResult<'a> {
    pub route: &'a Route,
    /// Extracted path parameters. Request-scoped; never mutated after match.
    pub params: HashMap<String, String>,
}

/// Route construction failures.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("route path is empty")]
    EmptyPath,

    #[error("invalid backend url for route {path}: {source}")]
    InvalidBackendUrl {
        path: String,
        #[source]
        source: axum::http::uri::InvalidUri,
    },

    #[error("backend url for route {path} must be absolute (scheme and host)")]
    RelativeBackendUrl { path: String },
}

impl Route {
    /// Compile a route from its config entry.
    pub fn new(cfg: RouteConfig) -> Result<Self, RouteError> {
        if cfg.path.is_empty() {
            return Err(RouteError::EmptyPath);
        }

        let url: Uri = cfg
            .backend
            .url
            .parse()
            .map_err(|source| RouteError::InvalidBackendUrl {
                path: cfg.path.clone(),
                source,
            })?;
        if url.scheme().is_none() || url.authority().is_none() {
            return Err(RouteError::RelativeBackendUrl { path: cfg.path });
        }

        Ok(Self {
            path: cfg.path,
            methods: cfg.methods.iter().map(|m| m.to_uppercase()).collect(),
            operation_id: cfg.operation_id,
            backend: Backend {
                url,
                timeout: Duration::from_millis(cfg.backend.timeout_ms),
                headers: cfg.backend.headers,
            },
            middleware: cfg.middleware,
            priority: cfg.priority,
        })
    }

    /// Whether the route accepts `method`. An empty method set accepts all.
    pub fn has_method(&self, method: &str) -> bool {
        self.methods.is_empty() || self.methods.iter().any(|m| m == method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;

    fn cfg(path: &str, url: &str, methods: Vec<&str>) -> RouteConfig {
        RouteConfig {
            path: path.into(),
            methods: methods.into_iter().map(String::from).collect(),
            operation_id: None,
            backend: BackendConfig {
                url: url.into(),
                timeout_ms: 1000,
                headers: Default::default(),
            },
            middleware: vec![],
            priority: 0,
        }
    }

    #[test]
    fn method_set_semantics() {
        let all = Route::new(cfg("/a", "http://h:1", vec![])).unwrap();
        assert!(all.has_method("GET"));
        assert!(all.has_method("DELETE"));

        let restricted = Route::new(cfg("/a", "http://h:1", vec!["get", "POST"])).unwrap();
        assert!(restricted.has_method("GET"));
        assert!(restricted.has_method("POST"));
        assert!(!restricted.has_method("DELETE"));
    }

    #[test]
    fn relative_backend_url_is_rejected() {
        assert!(matches!(
            Route::new(cfg("/a", "/just/a/path", vec![])),
            Err(RouteError::RelativeBackendUrl { .. })
        ));
    }
}
