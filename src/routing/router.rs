//! Route lookup and dispatch.
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Explicit error values rather than a silent default: an unmatched path
//!   is `RoutingNotFound`, a matched path with the wrong method is
//!   `MethodNotAllowed`
//! - Deterministic: match depends only on (config, method, path)

use std::collections::HashMap;

use crate::config::RoutingFileConfig;
use crate::error::GatewayError;
use crate::routing::route::{MatchResult, Route, RouteError};
use crate::routing::trie::{split_path, Node, TrieError};

/// The routing trie. Built at startup, read-only thereafter.
#[derive(Debug, Default)]
pub struct Router {
    root: Node,
}

/// Errors while building the router from config. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Trie(#[from] TrieError),
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a compiled route. Fails if another route already terminates at
    /// the same path template.
    pub fn insert(&mut self, route: Route) -> Result<(), RouterError> {
        if route.path.is_empty() {
            return Err(RouteError::EmptyPath.into());
        }
        let path = route.path.clone();
        let segments = split_path(&path);
        self.root.insert(&segments, route)?;
        Ok(())
    }

    /// Build a router from the routing config file.
    ///
    /// Routes load in priority order (ascending). Load order never affects
    /// dispatch; the trie resolves precedence structurally.
    pub fn from_config(cfg: &RoutingFileConfig) -> Result<Self, RouterError> {
        let mut sorted = cfg.routes.clone();
        sorted.sort_by_key(|r| r.priority);

        let mut router = Self::new();
        for route_cfg in sorted {
            router.insert(Route::new(route_cfg)?)?;
        }
        Ok(router)
    }

    /// Resolve `(method, path)` to a route and its extracted parameters.
    pub fn match_route(&self, method: &str, path: &str) -> Result<MatchResult<'_>, GatewayError> {
        let segments = split_path(path);
        let mut params = HashMap::new();

        let route = self
            .root
            .find(&segments, &mut params)
            .ok_or_else(|| GatewayError::RoutingNotFound(path.to_string()))?;

        if !route.has_method(method) {
            return Err(GatewayError::MethodNotAllowed(method.to_string()));
        }

        Ok(MatchResult { route, params })
    }

    /// All registered routes, for startup logging.
    pub fn routes(&self) -> Vec<&Route> {
        let mut out = Vec::new();
        self.root.collect(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendConfig, RouteConfig};

    fn route_cfg(path: &str, methods: Vec<&str>, priority: i32) -> RouteConfig {
        RouteConfig {
            path: path.into(),
            methods: methods.into_iter().map(String::from).collect(),
            operation_id: None,
            backend: BackendConfig {
                url: "http://localhost:3000".into(),
                timeout_ms: 1000,
                headers: Default::default(),
            },
            middleware: vec![],
            priority,
        }
    }

    fn router_with(routes: Vec<RouteConfig>) -> Router {
        Router::from_config(&RoutingFileConfig { routes }).unwrap()
    }

    #[test]
    fn insert_then_match_round_trips() {
        let router = router_with(vec![route_cfg("/api/v1/users", vec!["GET", "POST"], 0)]);

        let result = router.match_route("GET", "/api/v1/users").unwrap();
        assert_eq!(result.route.path, "/api/v1/users");
        assert!(result.params.is_empty());
    }

    #[test]
    fn trailing_slash_maps_to_same_route() {
        let router = router_with(vec![route_cfg("/api/v1/users", vec![], 0)]);

        assert!(router.match_route("GET", "/api/v1/users").is_ok());
        assert!(router.match_route("GET", "/api/v1/users/").is_ok());
    }

    #[test]
    fn unmatched_path_is_routing_not_found() {
        let router = router_with(vec![route_cfg("/api/v1/users", vec![], 0)]);

        let err = router.match_route("GET", "/api/v2/users").unwrap_err();
        assert!(matches!(err, GatewayError::RoutingNotFound(_)));

        // An empty router behaves the same.
        let empty = Router::new();
        assert!(matches!(
            empty.match_route("GET", "/anything").unwrap_err(),
            GatewayError::RoutingNotFound(_)
        ));
    }

    #[test]
    fn wrong_method_is_method_not_allowed() {
        let router = router_with(vec![route_cfg("/api/v1/users", vec!["GET"], 0)]);

        let err = router.match_route("DELETE", "/api/v1/users").unwrap_err();
        assert!(matches!(err, GatewayError::MethodNotAllowed(m) if m == "DELETE"));
    }

    #[test]
    fn match_does_not_mutate_the_trie() {
        let router = router_with(vec![route_cfg("/api/v1/users", vec![], 0)]);

        let _ = router.match_route("GET", "/nope");
        assert!(router.match_route("GET", "/api/v1/users").is_ok());
        assert_eq!(router.routes().len(), 1);
    }

    #[test]
    fn insertion_order_does_not_affect_match() {
        let a = router_with(vec![
            route_cfg("/api/users", vec![], 0),
            route_cfg("/api/:resource", vec![], 1),
        ]);
        let b = router_with(vec![
            route_cfg("/api/:resource", vec![], 0),
            route_cfg("/api/users", vec![], 1),
        ]);

        for router in [&a, &b] {
            let hit = router.match_route("GET", "/api/users").unwrap();
            assert_eq!(hit.route.path, "/api/users");
            let hit = router.match_route("GET", "/api/orders").unwrap();
            assert_eq!(hit.route.path, "/api/:resource");
        }
    }

    #[test]
    fn path_params_are_extracted() {
        let router = router_with(vec![route_cfg(
            "/api/v1/orders/:orderId/items/:itemId",
            vec!["GET"],
            0,
        )]);

        let result = router
            .match_route("GET", "/api/v1/orders/456/items/789")
            .unwrap();
        assert_eq!(result.params["orderId"], "456");
        assert_eq!(result.params["itemId"], "789");
    }

    #[test]
    fn duplicate_route_fails_loading() {
        let cfg = RoutingFileConfig {
            routes: vec![route_cfg("/a", vec![], 0), route_cfg("/a", vec![], 1)],
        };
        assert!(Router::from_config(&cfg).is_err());
    }
}
