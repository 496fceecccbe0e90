//! Middleware factory.
//!
//! Resolves config descriptors into concrete stages. All option bags are
//! validated here, at startup; a bad bag is a boot failure, never a
//! request-time surprise. The recovery descriptor configures the pipeline's
//! outermost wrapper rather than a chain stage.

use std::collections::HashMap;
use std::sync::Arc;

use jsonwebtoken::DecodingKey;
use serde::Deserialize;

use crate::config::{MiddlewareConfig, RoutingFileConfig};
use crate::middleware::auth::{JwtMiddleware, RevokeMiddleware};
use crate::middleware::cors::{CorsMiddleware, CorsOptions};
use crate::middleware::logging::LoggingMiddleware;
use crate::middleware::rbac::{OperationRoles, RbacMiddleware, Role};
use crate::middleware::recovery::Recovery;
use crate::middleware::{Chain, Middleware};
use crate::session::SessionRepository;

/// A route's resolved pipeline: recovery wrapping an ordered chain.
#[derive(Clone)]
pub struct RoutePipeline {
    pub recovery: Recovery,
    pub chain: Chain,
}

impl RoutePipeline {
    /// Pipeline with no stages, for routes that declare no middleware.
    pub fn empty() -> Self {
        Self {
            recovery: Recovery::default(),
            chain: Chain::default(),
        }
    }
}

/// Errors resolving middleware descriptors. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("unknown middleware type: {0}")]
    UnknownType(String),

    #[error("invalid {kind} middleware options: {source}")]
    InvalidOptions {
        kind: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("session repository is required for revoke middleware")]
    MissingSessionRepository,

    #[error("jwt public keys are required for jwt middleware")]
    MissingJwtKeys,

    #[error("invalid role '{role}' for operation {operation_id}")]
    InvalidRole { role: String, operation_id: String },
}

pub struct Factory {
    jwt_keys: Arc<HashMap<String, DecodingKey>>,
    jwt_skip_validation: bool,
    sessions: Option<Arc<dyn SessionRepository>>,
    operation_roles: OperationRoles,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JwtOptions {
    #[serde(default)]
    skip_validation: bool,
    #[serde(default)]
    required_claims: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RevokeOptions {
    /// Availability-first (true) or consistency-first (false). Required:
    /// the policy must be an explicit choice.
    fail_open: bool,
    #[serde(default = "default_user_id_claim")]
    user_id_claim: String,
    #[serde(default = "default_issued_at_claim")]
    issued_at_claim: String,
}

fn default_user_id_claim() -> String {
    "sub".to_string()
}

fn default_issued_at_claim() -> String {
    "iat".to_string()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LoggingOptions {
    skip_paths: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RecoveryOptions {
    enable_stack_trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RbacOptions {
    operation_id: String,
    #[serde(default)]
    allowed_roles: Option<Vec<String>>,
}

impl Factory {
    /// Build a factory, assembling the RBAC operation map from every rbac
    /// descriptor in the routing config.
    pub fn new(
        jwt_keys: Arc<HashMap<String, DecodingKey>>,
        jwt_skip_validation: bool,
        sessions: Option<Arc<dyn SessionRepository>>,
        routing: &RoutingFileConfig,
    ) -> Result<Self, FactoryError> {
        let mut operation_roles: HashMap<String, Vec<Role>> = HashMap::new();

        for route in &routing.routes {
            for descriptor in &route.middleware {
                if descriptor.kind != "rbac" {
                    continue;
                }
                let options: RbacOptions = parse_options("rbac", &descriptor.config)?;
                let Some(raw_roles) = options.allowed_roles else {
                    continue;
                };

                let mut roles = Vec::with_capacity(raw_roles.len());
                for raw in raw_roles {
                    let role = Role::parse(&raw).ok_or_else(|| FactoryError::InvalidRole {
                        role: raw.clone(),
                        operation_id: options.operation_id.clone(),
                    })?;
                    roles.push(role);
                }
                operation_roles.insert(options.operation_id.clone(), roles);
            }
        }

        Ok(Self {
            jwt_keys,
            jwt_skip_validation,
            sessions,
            operation_roles: Arc::new(operation_roles),
        })
    }

    /// Resolve a route's descriptor list into its pipeline.
    pub fn build(&self, descriptors: &[MiddlewareConfig]) -> Result<RoutePipeline, FactoryError> {
        let mut recovery = Recovery::default();
        let mut stages: Vec<Arc<dyn Middleware>> = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            if descriptor.kind == "recovery" {
                let options: RecoveryOptions = parse_options("recovery", &descriptor.config)?;
                recovery = Recovery::new(options.enable_stack_trace);
                continue;
            }
            stages.push(self.create(descriptor)?);
        }

        Ok(RoutePipeline {
            recovery,
            chain: Chain::new(stages),
        })
    }

    fn create(&self, descriptor: &MiddlewareConfig) -> Result<Arc<dyn Middleware>, FactoryError> {
        match descriptor.kind.as_str() {
            "jwt" => {
                let options: JwtOptions = parse_options("jwt", &descriptor.config)?;
                let skip = self.jwt_skip_validation || options.skip_validation;
                if !skip && self.jwt_keys.is_empty() {
                    return Err(FactoryError::MissingJwtKeys);
                }
                Ok(Arc::new(JwtMiddleware::new(
                    self.jwt_keys.clone(),
                    skip,
                    options.required_claims,
                )))
            }
            "revoke" => {
                let options: RevokeOptions = parse_options("revoke", &descriptor.config)?;
                let repo = self
                    .sessions
                    .clone()
                    .ok_or(FactoryError::MissingSessionRepository)?;
                Ok(Arc::new(RevokeMiddleware::new(
                    repo,
                    options.user_id_claim,
                    options.issued_at_claim,
                    options.fail_open,
                )))
            }
            "rbac" => {
                let options: RbacOptions = parse_options("rbac", &descriptor.config)?;
                Ok(Arc::new(RbacMiddleware::new(
                    options.operation_id,
                    self.operation_roles.clone(),
                )))
            }
            "cors" => {
                let options: CorsOptions = parse_options("cors", &descriptor.config)?;
                Ok(Arc::new(CorsMiddleware::new(options)))
            }
            "logging" => {
                let options: LoggingOptions = parse_options("logging", &descriptor.config)?;
                Ok(Arc::new(LoggingMiddleware::new(options.skip_paths)))
            }
            other => Err(FactoryError::UnknownType(other.to_string())),
        }
    }
}

fn parse_options<T: serde::de::DeserializeOwned>(
    kind: &str,
    bag: &serde_yaml::Mapping,
) -> Result<T, FactoryError> {
    serde_yaml::from_value(serde_yaml::Value::Mapping(bag.clone())).map_err(|source| {
        FactoryError::InvalidOptions {
            kind: kind.to_string(),
            source,
        }
    })
}
