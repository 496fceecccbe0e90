//! CORS stage.
//!
//! Inspects `Origin` and, when the origin is allowed, stores the response
//! header plan in the context. No response is emitted here; the gateway
//! handler applies the plan to whatever response the pipeline produces.
//! A disallowed origin simply gets no plan, which is how the browser is
//! refused.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::http::request::Parts;
use serde::Deserialize;

use crate::context::RequestContext;
use crate::error::GatewayError;
use crate::middleware::Middleware;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsOptions {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub exposed_headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age: u32,
}

impl Default for CorsOptions {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .map(String::from)
                .to_vec(),
            allowed_headers: ["Accept", "Content-Type", "Authorization"]
                .map(String::from)
                .to_vec(),
            exposed_headers: vec![],
            allow_credentials: false,
            max_age: 3600,
        }
    }
}

pub struct CorsMiddleware {
    options: CorsOptions,
}

impl CorsMiddleware {
    pub fn new(options: CorsOptions) -> Self {
        Self { options }
    }

    fn allows_any_origin(&self) -> bool {
        self.options.allowed_origins.len() == 1 && self.options.allowed_origins[0] == "*"
    }

    fn is_origin_allowed(&self, origin: &str) -> bool {
        self.allows_any_origin() || self.options.allowed_origins.iter().any(|o| o == origin)
    }

    fn header_plan(&self, origin: &str) -> HashMap<&'static str, String> {
        let mut headers = HashMap::new();

        let allow_origin = if self.allows_any_origin() {
            "*".to_string()
        } else {
            origin.to_string()
        };
        headers.insert("Access-Control-Allow-Origin", allow_origin);

        if !self.options.allowed_methods.is_empty() {
            headers.insert(
                "Access-Control-Allow-Methods",
                self.options.allowed_methods.join(", "),
            );
        }
        if !self.options.allowed_headers.is_empty() {
            headers.insert(
                "Access-Control-Allow-Headers",
                self.options.allowed_headers.join(", "),
            );
        }
        if !self.options.exposed_headers.is_empty() {
            headers.insert(
                "Access-Control-Expose-Headers",
                self.options.exposed_headers.join(", "),
            );
        }
        if self.options.allow_credentials {
            headers.insert("Access-Control-Allow-Credentials", "true".to_string());
        }
        if self.options.max_age > 0 {
            headers.insert("Access-Control-Max-Age", self.options.max_age.to_string());
        }

        headers
    }
}

#[async_trait]
impl Middleware for CorsMiddleware {
    async fn process(
        &self,
        ctx: RequestContext,
        req: &Parts,
    ) -> Result<RequestContext, GatewayError> {
        let origin = match req
            .headers
            .get(axum::http::header::ORIGIN)
            .and_then(|v| v.to_str().ok())
        {
            Some(origin) if !origin.is_empty() => origin,
            _ => return Ok(ctx),
        };

        if !self.is_origin_allowed(origin) {
            return Ok(ctx);
        }

        Ok(ctx.with_cors_headers(self.header_plan(origin)))
    }
}
