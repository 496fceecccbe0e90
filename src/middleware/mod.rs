//! Middleware subsystem.
//!
//! A stage transforms the request context or terminates the request with a
//! typed error. Stages never write responses; the error handler owns the
//! response surface.
//!
//! # Data Flow
//! ```text
//! RequestContext ─► stage 1 ─► stage 2 ─► … ─► stage N ─► proxy
//!                      │ error
//!                      ▼
//!               GatewayError → Problem Details writer
//! ```

pub mod auth;
pub mod cors;
pub mod factory;
pub mod logging;
pub mod rbac;
pub mod recovery;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::request::Parts;

use crate::context::RequestContext;
use crate::error::GatewayError;

pub use factory::{Factory, FactoryError, RoutePipeline};
pub use recovery::Recovery;

/// One middleware stage.
///
/// A stage receives the context by value and the immutable request head,
/// and returns a derived context or an error that short-circuits the chain.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn process(
        &self,
        ctx: RequestContext,
        req: &Parts,
    ) -> Result<RequestContext, GatewayError>;
}

/// An ordered middleware chain.
///
/// Config-driven chains are built once at startup and never mutated;
/// `append`/`prepend` exist for test scaffolding.
#[derive(Clone, Default)]
pub struct Chain {
    stages: Vec<Arc<dyn Middleware>>,
}

impl Chain {
    pub fn new(stages: Vec<Arc<dyn Middleware>>) -> Self {
        Self { stages }
    }

    /// Run every stage in order. The first error stops execution and is
    /// returned; no later stage observes the request.
    pub async fn execute(
        &self,
        mut ctx: RequestContext,
        req: &Parts,
    ) -> Result<RequestContext, GatewayError> {
        for stage in &self.stages {
            ctx = stage.process(ctx, req).await?;
        }
        Ok(ctx)
    }

    pub fn append(&mut self, stage: Arc<dyn Middleware>) {
        self.stages.push(stage);
    }

    pub fn prepend(&mut self, stage: Arc<dyn Middleware>) {
        self.stages.insert(0, stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
