//! Path trie for route storage.
//!
//! # Design Decisions
//! - One node per path segment; static children in a map, the parameter and
//!   wildcard children in dedicated slots (at most one of each per node)
//! - Matching precedence at every level: static, then parameter, then
//!   wildcard; the chosen child commits (no backtracking)
//! - A wildcard consumes the remainder and stops descent
//! - Match cost is O(segments)

use std::collections::HashMap;

use crate::routing::route::Route;

/// Segment classification for a trie node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Static,
    Param(String),
    Wildcard,
}

impl NodeKind {
    fn of(segment: &str) -> Self {
        if let Some(name) = segment.strip_prefix(':') {
            NodeKind::Param(name.to_string())
        } else if segment == "*" || segment == "**" {
            NodeKind::Wildcard
        } else {
            NodeKind::Static
        }
    }
}

/// A trie node. A terminal node carries at most one route.
#[derive(Debug, Default)]
pub(crate) struct Node {
    children: HashMap<String, Node>,
    param_child: Option<Box<Node>>,
    param_name: Option<String>,
    wildcard_child: Option<Box<Node>>,
    pub(crate) route: Option<Route>,
}

/// Insertion failures. These abort startup; the trie never changes shape at
/// request time.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TrieError {
    #[error("route already exists for path: {0}")]
    DuplicateRoute(String),

    #[error("conflicting parameter names at one level: :{existing} vs :{inserted}")]
    ParamConflict { existing: String, inserted: String },

    #[error("wildcard segment must be the last segment: {0}")]
    WildcardNotLast(String),
}

impl Node {
    /// Descend to (or create) the child for `segment`.
    fn child_for_insert(&mut self, segment: &str) -> Result<&mut Node, TrieError> {
        match NodeKind::of(segment) {
            NodeKind::Static => Ok(self.children.entry(segment.to_string()).or_default()),
            NodeKind::Param(name) => {
                match &self.param_name {
                    Some(existing) if *existing != name => {
                        return Err(TrieError::ParamConflict {
                            existing: existing.clone(),
                            inserted: name,
                        });
                    }
                    Some(_) => {}
                    None => self.param_name = Some(name),
                }
                Ok(self.param_child.get_or_insert_with(Default::default))
            }
            NodeKind::Wildcard => Ok(self.wildcard_child.get_or_insert_with(Default::default)),
        }
    }

    /// Install `route` at the node addressed by `segments`.
    pub(crate) fn insert(&mut self, segments: &[&str], route: Route) -> Result<(), TrieError> {
        let mut current = self;
        for (i, segment) in segments.iter().enumerate() {
            if matches!(NodeKind::of(segment), NodeKind::Wildcard) && i + 1 != segments.len() {
                return Err(TrieError::WildcardNotLast(route.path.clone()));
            }
            current = current.child_for_insert(segment)?;
        }

        if current.route.is_some() {
            return Err(TrieError::DuplicateRoute(route.path.clone()));
        }
        current.route = Some(route);
        Ok(())
    }

    /// Walk the trie, recording parameter captures.
    ///
    /// At each level the highest-precedence child that accepts the segment
    /// is chosen and committed; a dead end deeper down does not fall back to
    /// a lower-precedence sibling.
    pub(crate) fn find<'a>(
        &'a self,
        segments: &[&str],
        params: &mut HashMap<String, String>,
    ) -> Option<&'a Route> {
        if segments.is_empty() {
            return self.route.as_ref();
        }

        let segment = segments[0];
        let rest = &segments[1..];

        if let Some(child) = self.children.get(segment) {
            return child.find(rest, params);
        }

        if let Some(child) = &self.param_child {
            let name = self.param_name.clone().unwrap_or_default();
            params.insert(name, segment.to_string());
            return child.find(rest, params);
        }

        // A wildcard swallows the remainder; descent stops here.
        if let Some(child) = &self.wildcard_child {
            return child.route.as_ref();
        }

        None
    }

    /// Collect every registered route, depth-first.
    pub(crate) fn collect<'a>(&'a self, out: &mut Vec<&'a Route>) {
        if let Some(route) = &self.route {
            out.push(route);
        }
        for child in self.children.values() {
            child.collect(out);
        }
        if let Some(child) = &self.param_child {
            child.collect(out);
        }
        if let Some(child) = &self.wildcard_child {
            child.collect(out);
        }
    }
}

/// Split a request path into segments, ignoring leading and trailing
/// slashes so `/a/b` and `/a/b/` address the same route.
pub fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendConfig, RouteConfig};
    use crate::routing::route::Route;

    fn route(path: &str) -> Route {
        Route::new(RouteConfig {
            path: path.to_string(),
            methods: vec![],
            operation_id: None,
            backend: BackendConfig {
                url: "http://localhost:3000".into(),
                timeout_ms: 1000,
                headers: Default::default(),
            },
            middleware: vec![],
            priority: 0,
        })
        .unwrap()
    }

    fn insert(node: &mut Node, path: &str) -> Result<(), TrieError> {
        let segments = split_path(path);
        node.insert(&segments, route(path))
    }

    #[test]
    fn split_path_trims_both_slashes() {
        assert_eq!(split_path("/a/b/"), vec!["a", "b"]);
        assert_eq!(split_path("a/b"), vec!["a", "b"]);
        assert_eq!(split_path("/"), Vec::<&str>::new());
        assert_eq!(split_path(""), Vec::<&str>::new());
    }

    #[test]
    fn static_beats_param() {
        let mut root = Node::default();
        insert(&mut root, "/api/users").unwrap();
        insert(&mut root, "/api/:resource").unwrap();

        let mut params = HashMap::new();
        let hit = root.find(&split_path("/api/users"), &mut params).unwrap();
        assert_eq!(hit.path, "/api/users");
        assert!(params.is_empty());

        let mut params = HashMap::new();
        let hit = root.find(&split_path("/api/orders"), &mut params).unwrap();
        assert_eq!(hit.path, "/api/:resource");
        assert_eq!(params["resource"], "orders");
    }

    #[test]
    fn wildcard_matches_remainder() {
        let mut root = Node::default();
        insert(&mut root, "/files/*").unwrap();

        let mut params = HashMap::new();
        assert!(root
            .find(&split_path("/files/a/b/c/d"), &mut params)
            .is_some());
        assert!(root.find(&split_path("/other"), &mut params).is_none());
    }

    #[test]
    fn chosen_child_commits_without_backtracking() {
        let mut root = Node::default();
        insert(&mut root, "/api/users/profile").unwrap();
        insert(&mut root, "/api/:resource/list").unwrap();

        // "users" picks the static child, so ":resource/list" is never
        // consulted for /api/users/list.
        let mut params = HashMap::new();
        assert!(root.find(&split_path("/api/users/list"), &mut params).is_none());

        let mut params = HashMap::new();
        let hit = root
            .find(&split_path("/api/orders/list"), &mut params)
            .unwrap();
        assert_eq!(hit.path, "/api/:resource/list");
    }

    #[test]
    fn duplicate_terminal_is_rejected() {
        let mut root = Node::default();
        insert(&mut root, "/api/users").unwrap();
        assert_eq!(
            insert(&mut root, "/api/users"),
            Err(TrieError::DuplicateRoute("/api/users".into()))
        );
    }

    #[test]
    fn conflicting_param_names_are_rejected() {
        let mut root = Node::default();
        insert(&mut root, "/api/:id").unwrap();
        assert!(matches!(
            insert(&mut root, "/api/:name/details"),
            Err(TrieError::ParamConflict { .. })
        ));
    }

    #[test]
    fn wildcard_must_be_last() {
        let mut root = Node::default();
        assert!(matches!(
            insert(&mut root, "/api/*/users"),
            Err(TrieError::WildcardNotLast(_))
        ));
    }

    #[test]
    fn two_params_capture_both_segments() {
        let mut root = Node::default();
        insert(&mut root, "/api/v1/orders/:orderId/items/:itemId").unwrap();

        let mut params = HashMap::new();
        let hit = root
            .find(&split_path("/api/v1/orders/456/items/789"), &mut params)
            .unwrap();
        assert_eq!(hit.path, "/api/v1/orders/:orderId/items/:itemId");
        assert_eq!(params["orderId"], "456");
        assert_eq!(params["itemId"], "789");
    }
}
