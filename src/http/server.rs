//! HTTP server setup and the data-plane gateway handler.
//!
//! # Responsibilities
//! - Build the Axum router: wildcard data plane + the two admin endpoints
//! - Resolve each configured route's middleware pipeline once at startup
//! - Drive match → chain → proxy per request
//! - Serve with graceful shutdown and a bounded drain window

use std::collections::HashMap;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router as AxumRouter;
use chrono::Utc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::admin::{self, AdminState};
use crate::config::{GatewayConfig, RoutingFileConfig};
use crate::context::RequestContext;
use crate::http::problem::problem_response;
use crate::middleware::auth::{load_public_keys, KeyError};
use crate::middleware::{Factory, FactoryError, RoutePipeline};
use crate::routing::{Router, RouterError};
use crate::session::SessionRepository;
use crate::transport::{HttpTransporter, Transporter};

const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Application state injected into the data-plane handler.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
    /// Route path template → resolved pipeline. Built once; read-only.
    pub pipelines: Arc<HashMap<String, RoutePipeline>>,
    pub transporter: Arc<dyn Transporter>,
}

/// Errors assembling the server from config. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Router(#[from] RouterError),

    #[error(transparent)]
    Keys(#[from] KeyError),

    #[error(transparent)]
    Factory(#[from] FactoryError),
}

/// Errors while serving.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("server io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("drain window exceeded, connections force-closed")]
    DrainTimeout,
}

/// The gateway HTTP server.
pub struct GatewayServer {
    app: AxumRouter,
}

impl GatewayServer {
    /// Assemble the server: routing trie, per-route pipelines, transporter,
    /// admin endpoints.
    pub fn new(
        config: &GatewayConfig,
        routing: &RoutingFileConfig,
        sessions: Option<Arc<dyn SessionRepository>>,
    ) -> Result<Self, BuildError> {
        let router = Arc::new(Router::from_config(routing)?);
        tracing::info!(count = router.routes().len(), "routes loaded");

        let jwt = config.jwt.clone().unwrap_or_default();
        let keys = Arc::new(load_public_keys(&jwt.public_key_files)?);
        if !keys.is_empty() {
            tracing::info!(count = keys.len(), "jwt public keys loaded");
        }

        let factory = Factory::new(keys, jwt.skip_validation, sessions.clone(), routing)?;
        let mut pipelines = HashMap::with_capacity(routing.routes.len());
        for route in &routing.routes {
            pipelines.insert(route.path.clone(), factory.build(&route.middleware)?);
        }

        let state = AppState {
            router,
            pipelines: Arc::new(pipelines),
            transporter: Arc::new(HttpTransporter::new()),
        };

        let admin_state = AdminState {
            sessions,
            api_key: config.admin.api_key.clone(),
            user_id_claim: config.admin.user_id_claim.clone(),
            marker_ttl: chrono::Duration::seconds(jwt.max_token_lifetime_secs as i64),
        };

        let admin_routes = AxumRouter::new()
            .route("/logout", any(admin::logout))
            .route("/revoke", any(admin::admin_revoke))
            .with_state(admin_state);

        let app = AxumRouter::new()
            .fallback(gateway_handler)
            .with_state(state)
            .merge(admin_routes)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.write_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http());

        Ok(Self { app })
    }

    /// Serve until `shutdown_rx` fires, then drain in-flight requests for
    /// at most `drain`. Overrunning the window is an error so the process
    /// can exit non-zero.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
        drain: Duration,
    ) -> Result<(), ServeError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let mut graceful_rx = shutdown_rx.resubscribe();
        let mut signal_rx = shutdown_rx;

        let serve = axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = graceful_rx.recv().await;
            })
            .into_future();
        tokio::pin!(serve);

        tokio::select! {
            result = &mut serve => {
                result?;
            }
            _ = signal_rx.recv() => {
                tracing::info!(
                    drain_secs = drain.as_secs(),
                    "shutdown signal received, draining in-flight requests"
                );
                match tokio::time::timeout(drain, &mut serve).await {
                    Ok(result) => result?,
                    Err(_) => {
                        tracing::error!("drain window exceeded, forcing shutdown");
                        return Err(ServeError::DrainTimeout);
                    }
                }
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Data-plane handler: match, run the pipeline, proxy the survivor.
async fn gateway_handler(State(state): State<AppState>, req: Request<Body>) -> Response {
    // CORS preflight never reaches a backend.
    if req.method() == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let matched = match state.router.match_route(method.as_str(), &path) {
        Ok(matched) => matched,
        Err(err) => return problem_response(&err, &path, None),
    };

    tracing::debug!(
        method = %method,
        path = %path,
        route = %matched.route.path,
        params = ?matched.params,
        "route matched"
    );

    let pipeline = state
        .pipelines
        .get(&matched.route.path)
        .cloned()
        .unwrap_or_else(RoutePipeline::empty);

    let (parts, body) = req.into_parts();
    let ctx = match pipeline
        .recovery
        .run(None, pipeline.chain.execute(RequestContext::new(), &parts))
        .await
    {
        Ok(ctx) => ctx,
        Err(err) => return problem_response(&err, &path, None),
    };
    let request_id = ctx.request_id.clone();

    let upstream_req = Request::from_parts(parts, body);
    let result = pipeline
        .recovery
        .run(
            request_id.as_deref(),
            state
                .transporter
                .forward(upstream_req, &matched.route.backend),
        )
        .await;

    let mut response = match result {
        Ok(response) => response,
        Err(err) => return decorate(problem_response(&err, &path, request_id.as_deref()), &ctx),
    };

    if let Some(id) = &request_id {
        if let Ok(value) = HeaderValue::from_str(id) {
            response.headers_mut().insert(X_REQUEST_ID, value);
        }
    }
    let response = decorate(response, &ctx);

    if let (Some(id), Some(start)) = (&request_id, ctx.start_time) {
        let elapsed_ms = (Utc::now() - start).num_milliseconds();
        tracing::info!(
            request_id = %id,
            status = response.status().as_u16(),
            duration_ms = elapsed_ms,
            "request completed"
        );
    }

    response
}

/// Apply the CORS header plan the pipeline stored, if any.
fn decorate(mut response: Response, ctx: &RequestContext) -> Response {
    if let Some(plan) = &ctx.cors_headers {
        for (name, value) in plan.iter() {
            if let (Ok(name), Ok(value)) = (
                name.parse::<HeaderName>(),
                HeaderValue::from_str(value),
            ) {
                response.headers_mut().insert(name, value);
            }
        }
    }
    response
}
