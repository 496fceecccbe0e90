//! Role-based authorization stage.
//!
//! The operation-id → allowed-roles map is assembled once at startup from
//! the routing config. An operation id with no mapping is denied: a new
//! route added without an RBAC entry must fail loudly, not slip through.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::request::Parts;

use crate::context::RequestContext;
use crate::error::GatewayError;
use crate::middleware::Middleware;

/// Enumerated user roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Role> {
        match raw {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

/// Shared operation → allowed roles table.
pub type OperationRoles = Arc<HashMap<String, Vec<Role>>>;

pub struct RbacMiddleware {
    operation_id: String,
    roles: OperationRoles,
}

impl RbacMiddleware {
    pub fn new(operation_id: String, roles: OperationRoles) -> Self {
        Self {
            operation_id,
            roles,
        }
    }
}

#[async_trait]
impl Middleware for RbacMiddleware {
    async fn process(
        &self,
        ctx: RequestContext,
        _req: &Parts,
    ) -> Result<RequestContext, GatewayError> {
        let allowed = match self.roles.get(&self.operation_id) {
            Some(allowed) => allowed,
            None => {
                tracing::warn!(
                    operation_id = %self.operation_id,
                    "authorization denied: operation has no role mapping"
                );
                return Err(GatewayError::Forbidden(
                    "no role mapping — default deny".to_string(),
                ));
            }
        };

        let claims = ctx
            .claims
            .as_ref()
            .ok_or_else(|| GatewayError::Unauthorized("missing auth context".to_string()))?;

        let role = claims
            .get("role")
            .and_then(|v| v.as_str())
            .and_then(Role::parse)
            .ok_or_else(|| GatewayError::Unauthorized("invalid role".to_string()))?;

        if !allowed.contains(&role) {
            return Err(GatewayError::Forbidden(
                "insufficient permissions".to_string(),
            ));
        }

        Ok(ctx)
    }
}
