//! Per-request context shared across middleware stages.
//!
//! The context is immutable by convention: a stage receives it by value and
//! returns a derived copy. Nothing in the pipeline mutates a context another
//! stage already observed.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// Decoded JWT payload. The gateway does not assume a closed claim schema,
/// so claims stay a JSON object.
pub type Claims = serde_json::Map<String, serde_json::Value>;

/// Request-scoped data threaded through the middleware chain.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Request id stamped by the logging stage.
    pub request_id: Option<String>,
    /// Wall-clock start stamped by the logging stage.
    pub start_time: Option<DateTime<Utc>>,
    /// Claims stored by the JWT stage.
    pub claims: Option<Arc<Claims>>,
    /// Response headers planned by the CORS stage. Applied by the response
    /// writer, never emitted by the stage itself.
    pub cors_headers: Option<Arc<HashMap<&'static str, String>>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_id(mut self, request_id: String, start_time: DateTime<Utc>) -> Self {
        self.request_id = Some(request_id);
        self.start_time = Some(start_time);
        self
    }

    pub fn with_claims(mut self, claims: Claims) -> Self {
        self.claims = Some(Arc::new(claims));
        self
    }

    pub fn with_cors_headers(mut self, headers: HashMap<&'static str, String>) -> Self {
        self.cors_headers = Some(Arc::new(headers));
        self
    }
}
