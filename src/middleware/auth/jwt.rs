//! JWT verification stage.
//!
//! Verifies the Bearer token against the configured `kid → RSA public key`
//! map. The signing algorithm must be RS256; `exp` and `nbf` are checked by
//! the decoder; configured required claims must be present. Verified claims
//! land in the request context for the revoke and rbac stages.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::context::{Claims, RequestContext};
use crate::error::GatewayError;
use crate::middleware::Middleware;

pub struct JwtMiddleware {
    keys: Arc<HashMap<String, DecodingKey>>,
    skip_validation: bool,
    required_claims: Vec<String>,
}

impl JwtMiddleware {
    pub fn new(
        keys: Arc<HashMap<String, DecodingKey>>,
        skip_validation: bool,
        required_claims: Vec<String>,
    ) -> Self {
        Self {
            keys,
            skip_validation,
            required_claims,
        }
    }

    fn verify(&self, token: &str) -> Result<Claims, GatewayError> {
        // Shape check first so a mangled token reads as a 401, not a parse
        // failure deeper down.
        if token.split('.').count() != 3 {
            return Err(GatewayError::Unauthorized("invalid token format".into()));
        }

        let header = jsonwebtoken::decode_header(token)
            .map_err(|_| GatewayError::Unauthorized("invalid token format".into()))?;

        if header.alg != Algorithm::RS256 {
            return Err(GatewayError::Unauthorized(
                "unexpected signing method".into(),
            ));
        }

        let kid = header
            .kid
            .ok_or_else(|| GatewayError::Unauthorized("kid header not found".into()))?;

        let key = self
            .keys
            .get(&kid)
            .ok_or_else(|| GatewayError::Unauthorized(format!("unknown key id: {kid}")))?;

        let mut validation = Validation::new(Algorithm::RS256);
        // exp and nbf are validated when present but neither is mandatory;
        // only the configured required_claims list decides presence.
        validation.required_spec_claims.clear();
        validation.validate_nbf = true;

        let decoded = jsonwebtoken::decode::<Claims>(token, key, &validation)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    GatewayError::Unauthorized("token is expired".into())
                }
                jsonwebtoken::errors::ErrorKind::ImmatureSignature => {
                    GatewayError::Unauthorized("token is not yet valid".into())
                }
                _ => GatewayError::Unauthorized("invalid token".into()),
            })?;

        for name in &self.required_claims {
            if !decoded.claims.contains_key(name) {
                return Err(GatewayError::Unauthorized(format!(
                    "missing required claim: {name}"
                )));
            }
        }

        Ok(decoded.claims)
    }
}

/// Pull the Bearer token out of the Authorization header.
pub fn extract_bearer(parts: &Parts) -> Result<&str, GatewayError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| GatewayError::Unauthorized("missing authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| GatewayError::Unauthorized("invalid authorization format".into()))?
        .trim();

    if token.is_empty() {
        return Err(GatewayError::Unauthorized("empty token".into()));
    }

    Ok(token)
}

#[async_trait]
impl Middleware for JwtMiddleware {
    async fn process(
        &self,
        ctx: RequestContext,
        req: &Parts,
    ) -> Result<RequestContext, GatewayError> {
        let token = extract_bearer(req)?;

        if self.skip_validation {
            let mut claims = Claims::new();
            claims.insert("skip_validation".into(), true.into());
            return Ok(ctx.with_claims(claims));
        }

        let claims = self.verify(token)?;
        Ok(ctx.with_claims(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::testing::{sign_hs256, sign_rs256, test_keys};
    use crate::middleware::testing::request_parts;
    use serde_json::json;

    fn stage(required: &[&str]) -> JwtMiddleware {
        JwtMiddleware::new(
            Arc::new(test_keys()),
            false,
            required.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn bearer(token: &str) -> Parts {
        request_parts("GET", "/a", &[("authorization", &format!("Bearer {token}"))])
    }

    #[tokio::test]
    async fn valid_token_stores_claims() {
        let token = sign_rs256(
            "key-1",
            json!({"sub": "u1", "iat": 1000, "exp": 9_999_999_999i64, "role": "admin"}),
        );

        let ctx = stage(&["sub", "iat"])
            .process(RequestContext::new(), &bearer(&token))
            .await
            .unwrap();

        let claims = ctx.claims.expect("claims stored");
        assert_eq!(claims["sub"], "u1");
        assert_eq!(claims["role"], "admin");
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let parts = request_parts("GET", "/a", &[]);
        let err = stage(&[])
            .process(RequestContext::new(), &parts)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized(m) if m == "missing authorization header"));
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_unauthorized() {
        let parts = request_parts("GET", "/a", &[("authorization", "Basic dXNlcjpwdw==")]);
        let err = stage(&[])
            .process(RequestContext::new(), &parts)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized(m) if m == "invalid authorization format"));
    }

    #[tokio::test]
    async fn empty_token_is_distinct_from_parse_failure() {
        let parts = request_parts("GET", "/a", &[("authorization", "Bearer ")]);
        let err = stage(&[])
            .process(RequestContext::new(), &parts)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized(m) if m == "empty token"));
    }

    #[tokio::test]
    async fn wrong_segment_count_is_unauthorized_not_500() {
        for token in ["a.b", "a.b.c.d"] {
            let err = stage(&[])
                .process(RequestContext::new(), &bearer(token))
                .await
                .unwrap_err();
            assert!(
                matches!(err, GatewayError::Unauthorized(ref m) if m == "invalid token format"),
                "token {token}: {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn non_rs256_algorithm_is_rejected() {
        let token = sign_hs256(json!({"sub": "u1", "exp": 9_999_999_999i64}));
        let err = stage(&[])
            .process(RequestContext::new(), &bearer(&token))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized(m) if m == "unexpected signing method"));
    }

    #[tokio::test]
    async fn unknown_kid_is_rejected() {
        let token = sign_rs256("key-unknown", json!({"sub": "u1", "exp": 9_999_999_999i64}));
        let err = stage(&[])
            .process(RequestContext::new(), &bearer(&token))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized(m) if m.starts_with("unknown key id")));
    }

    #[tokio::test]
    async fn tampered_signature_is_rejected() {
        let token = sign_rs256("key-1", json!({"sub": "u1", "exp": 9_999_999_999i64}));
        let mut tampered = token[..token.len() - 4].to_string();
        tampered.push_str("AAAA");

        let err = stage(&[])
            .process(RequestContext::new(), &bearer(&tampered))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn token_without_exp_is_accepted() {
        let token = sign_rs256("key-1", json!({"sub": "u1", "iat": 1000, "role": "user"}));

        let ctx = stage(&["sub", "iat"])
            .process(RequestContext::new(), &bearer(&token))
            .await
            .unwrap();

        let claims = ctx.claims.expect("claims stored");
        assert_eq!(claims["sub"], "u1");
        assert!(!claims.contains_key("exp"));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let token = sign_rs256("key-1", json!({"sub": "u1", "iat": 1000, "exp": 2000}));
        let err = stage(&[])
            .process(RequestContext::new(), &bearer(&token))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized(m) if m == "token is expired"));
    }

    #[tokio::test]
    async fn missing_required_claim_names_the_claim() {
        let token = sign_rs256("key-1", json!({"sub": "u1", "exp": 9_999_999_999i64}));
        let err = stage(&["sub", "tenant"])
            .process(RequestContext::new(), &bearer(&token))
            .await
            .unwrap_err();
        assert!(
            matches!(err, GatewayError::Unauthorized(m) if m == "missing required claim: tenant")
        );
    }

    #[tokio::test]
    async fn skip_validation_stores_sentinel_claims() {
        let stage = JwtMiddleware::new(Arc::new(HashMap::new()), true, vec![]);
        let ctx = stage
            .process(RequestContext::new(), &bearer("anything"))
            .await
            .unwrap();

        let claims = ctx.claims.expect("sentinel claims stored");
        assert_eq!(claims["skip_validation"], true);
    }
}
