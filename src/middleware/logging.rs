//! Access-log stage.
//!
//! Stamps a request id and start time into the context and emits the
//! "incoming request" line. The matching response line is written by the
//! gateway handler once the status is known.

use async_trait::async_trait;
use axum::http::request::Parts;
use chrono::Utc;
use uuid::Uuid;

use crate::context::RequestContext;
use crate::error::GatewayError;
use crate::middleware::Middleware;

pub struct LoggingMiddleware {
    skip_paths: Vec<String>,
}

impl LoggingMiddleware {
    pub fn new(skip_paths: Vec<String>) -> Self {
        Self { skip_paths }
    }
}

#[async_trait]
impl Middleware for LoggingMiddleware {
    async fn process(
        &self,
        ctx: RequestContext,
        req: &Parts,
    ) -> Result<RequestContext, GatewayError> {
        let path = req.uri.path();
        if self.skip_paths.iter().any(|p| p == path) {
            return Ok(ctx);
        }

        let request_id = Uuid::new_v4().to_string();
        let user_agent = req
            .headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        match req.uri.query() {
            Some(query) => tracing::info!(
                request_id = %request_id,
                method = %req.method,
                path = %path,
                query = %query,
                user_agent = %user_agent,
                "incoming request"
            ),
            None => tracing::info!(
                request_id = %request_id,
                method = %req.method,
                path = %path,
                user_agent = %user_agent,
                "incoming request"
            ),
        }

        Ok(ctx.with_request_id(request_id, Utc::now()))
    }
}
