//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (trie walk, method check)
//!     → Return: MatchResult { route, params } or RoutingNotFound /
//!       MethodNotAllowed
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Sort by priority (load order only)
//!     → Compile into trie nodes (static | param | wildcard)
//!     → Freeze as immutable Router
//! ```

pub mod route;
pub mod router;
pub mod trie;

pub use route::{Backend, MatchResult, Route, RouteError};
pub use router::{Router, RouterError};
pub use trie::split_path;
