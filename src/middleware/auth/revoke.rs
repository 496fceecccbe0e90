//! Distributed revocation stage.
//!
//! Compares the token's issued-at instant to the user's revocation marker
//! in the session store. The `fail_open` policy decides what happens when
//! the store is unreachable: pass and warn (availability first) or refuse
//! with 503 (consistency first). There is no implicit default; config must
//! choose.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::request::Parts;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::context::{Claims, RequestContext};
use crate::error::GatewayError;
use crate::middleware::Middleware;
use crate::session::SessionRepository;

pub struct RevokeMiddleware {
    repo: Arc<dyn SessionRepository>,
    user_id_claim: String,
    issued_at_claim: String,
    fail_open: bool,
}

impl RevokeMiddleware {
    pub fn new(
        repo: Arc<dyn SessionRepository>,
        user_id_claim: String,
        issued_at_claim: String,
        fail_open: bool,
    ) -> Self {
        Self {
            repo,
            user_id_claim,
            issued_at_claim,
            fail_open,
        }
    }

    fn user_id<'a>(&self, claims: &'a Claims) -> Option<&'a str> {
        claims
            .get(&self.user_id_claim)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Issued-at as a UTC instant. Accepts integer and float encodings;
    /// JSON decoders disagree on which one a unix timestamp becomes.
    fn issued_at(&self, claims: &Claims) -> Option<DateTime<Utc>> {
        let value = claims.get(&self.issued_at_claim)?;
        let seconds = value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f as i64))?;
        DateTime::from_timestamp(seconds, 0)
    }
}

#[async_trait]
impl Middleware for RevokeMiddleware {
    async fn process(
        &self,
        ctx: RequestContext,
        _req: &Parts,
    ) -> Result<RequestContext, GatewayError> {
        // Runs after the jwt stage. No claims means nothing to check here;
        // whether anonymous traffic is acceptable is the jwt stage's call.
        let claims = match ctx.claims.as_ref() {
            Some(claims) => claims.clone(),
            None => return Ok(ctx),
        };

        let user_id = match self.user_id(&claims) {
            Some(user_id) => user_id.to_string(),
            None => {
                tracing::warn!(claim = %self.user_id_claim, "user id claim missing or empty");
                return Err(GatewayError::Unauthorized("invalid token claims".into()));
            }
        };

        let issued_at = match self.issued_at(&claims) {
            Some(issued_at) => issued_at,
            None => {
                tracing::warn!(
                    claim = %self.issued_at_claim,
                    user_id = %user_id,
                    "issued-at claim missing or not numeric"
                );
                return Err(GatewayError::Unauthorized("invalid token claims".into()));
            }
        };

        let revoked_at = match self.repo.get_revoked_time(&user_id).await {
            Ok(revoked_at) => revoked_at,
            Err(error) => {
                tracing::error!(%error, user_id = %user_id, "session store lookup failed");
                if self.fail_open {
                    tracing::warn!(
                        user_id = %user_id,
                        "session store unreachable, allowing request (fail-open)"
                    );
                    return Ok(ctx);
                }
                return Err(GatewayError::ServiceUnavailable);
            }
        };

        match revoked_at {
            None => Ok(ctx),
            Some(revoked_at) if issued_at >= revoked_at => Ok(ctx),
            Some(revoked_at) => {
                tracing::info!(
                    user_id = %user_id,
                    issued_at = %issued_at.to_rfc3339(),
                    revoked_at = %revoked_at.to_rfc3339(),
                    "token revoked"
                );
                Err(GatewayError::Unauthorized("token has been revoked".into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::testing::request_parts;
    use crate::session::{MemorySessionRepository, SessionStoreError};
    use chrono::Duration;

    struct FailingRepository;

    #[async_trait]
    impl SessionRepository for FailingRepository {
        async fn set_revoked_time(
            &self,
            _: &str,
            _: DateTime<Utc>,
            _: Duration,
        ) -> Result<(), SessionStoreError> {
            Err(SessionStoreError::Timeout)
        }

        async fn get_revoked_time(
            &self,
            _: &str,
        ) -> Result<Option<DateTime<Utc>>, SessionStoreError> {
            Err(SessionStoreError::Timeout)
        }

        async fn delete_revoked_time(&self, _: &str) -> Result<(), SessionStoreError> {
            Err(SessionStoreError::Timeout)
        }
    }

    fn stage(repo: Arc<dyn SessionRepository>, fail_open: bool) -> RevokeMiddleware {
        RevokeMiddleware::new(repo, "sub".into(), "iat".into(), fail_open)
    }

    fn ctx(sub: &str, iat: serde_json::Value) -> RequestContext {
        let mut claims = Claims::new();
        claims.insert("sub".into(), sub.into());
        claims.insert("iat".into(), iat);
        RequestContext::new().with_claims(claims)
    }

    async fn repo_with_marker(user: &str, revoked_at: DateTime<Utc>) -> Arc<MemorySessionRepository> {
        let repo = Arc::new(MemorySessionRepository::new());
        repo.set_revoked_time(user, revoked_at, Duration::hours(10))
            .await
            .unwrap();
        repo
    }

    #[tokio::test]
    async fn no_claims_passes_through() {
        let stage = stage(Arc::new(MemorySessionRepository::new()), false);
        let parts = request_parts("GET", "/a", &[]);

        assert!(stage.process(RequestContext::new(), &parts).await.is_ok());
    }

    #[tokio::test]
    async fn absent_marker_passes() {
        let stage = stage(Arc::new(MemorySessionRepository::new()), false);
        let parts = request_parts("GET", "/a", &[]);

        assert!(stage.process(ctx("u1", 1000.into()), &parts).await.is_ok());
    }

    #[tokio::test]
    async fn token_issued_before_marker_is_revoked() {
        let revoked_at = DateTime::from_timestamp(2000, 0).unwrap();
        let repo = repo_with_marker("u1", revoked_at).await;
        let stage = stage(repo, false);
        let parts = request_parts("GET", "/a", &[]);

        let err = stage
            .process(ctx("u1", 1000.into()), &parts)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized(m) if m == "token has been revoked"));
    }

    #[tokio::test]
    async fn token_issued_at_or_after_marker_passes() {
        let revoked_at = DateTime::from_timestamp(2000, 0).unwrap();
        let repo = repo_with_marker("u1", revoked_at).await;
        let stage = stage(repo, false);
        let parts = request_parts("GET", "/a", &[]);

        // Exactly at the marker: iat ≥ revokedAt passes.
        assert!(stage.process(ctx("u1", 2000.into()), &parts).await.is_ok());
        assert!(stage.process(ctx("u1", 3000.into()), &parts).await.is_ok());
    }

    #[tokio::test]
    async fn float_iat_is_accepted() {
        let revoked_at = DateTime::from_timestamp(2000, 0).unwrap();
        let repo = repo_with_marker("u1", revoked_at).await;
        let stage = stage(repo, false);
        let parts = request_parts("GET", "/a", &[]);

        let err = stage
            .process(ctx("u1", serde_json::json!(1000.0)), &parts)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn store_error_fails_closed_by_default_config() {
        let stage = stage(Arc::new(FailingRepository), false);
        let parts = request_parts("GET", "/a", &[]);

        let err = stage
            .process(ctx("u1", 1000.into()), &parts)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ServiceUnavailable));
    }

    #[tokio::test]
    async fn store_error_fails_open_when_configured() {
        let stage = stage(Arc::new(FailingRepository), true);
        let parts = request_parts("GET", "/a", &[]);

        assert!(stage.process(ctx("u1", 1000.into()), &parts).await.is_ok());
    }

    #[tokio::test]
    async fn empty_user_id_is_invalid_claims() {
        let stage = stage(Arc::new(MemorySessionRepository::new()), false);
        let parts = request_parts("GET", "/a", &[]);

        let err = stage
            .process(ctx("", 1000.into()), &parts)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized(m) if m == "invalid token claims"));
    }

    #[tokio::test]
    async fn non_numeric_iat_is_invalid_claims() {
        let stage = stage(Arc::new(MemorySessionRepository::new()), false);
        let parts = request_parts("GET", "/a", &[]);

        let err = stage
            .process(ctx("u1", "yesterday".into()), &parts)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized(m) if m == "invalid token claims"));
    }
}
