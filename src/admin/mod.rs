//! Administrative endpoints for the revocation trust layer.
//!
//! Two distinct HTTP surfaces share one store-write path
//! (`session::write_revocation`):
//! - `DELETE /logout`: user-initiated, authenticated by the bearer token
//! - `POST /revoke`: operator-initiated, authenticated by a shared key

pub mod claims;
pub mod logout;
pub mod revoke;

use std::sync::Arc;

use chrono::Duration;

use crate::session::SessionRepository;

pub use logout::logout;
pub use revoke::admin_revoke;

/// State injected into the admin handlers.
#[derive(Clone)]
pub struct AdminState {
    /// Session store. Absent when no store is configured; the endpoints
    /// then answer 503 instead of silently succeeding.
    pub sessions: Option<Arc<dyn SessionRepository>>,

    /// Shared secret for the forced-revoke endpoint.
    pub api_key: String,

    /// Claim holding the user id (default "sub").
    pub user_id_claim: String,

    /// TTL for revocation markers: the maximum JWT lifetime.
    pub marker_ttl: Duration,
}
