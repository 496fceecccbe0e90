//! Operator-initiated forced revocation.
//!
//! `POST /revoke` is authenticated by a shared key in `X-API-Key`. The key
//! comparison is constant-time; a timing oracle on the admin surface would
//! undo the whole trust layer.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::admin::AdminState;
use crate::error::{GatewayError, ValidationCode};
use crate::http::problem::problem_response;
use crate::session::write_revocation;

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
struct RevokeRequest {
    #[serde(default)]
    user_id: String,
}

#[derive(Debug, Serialize)]
struct RevokeResponse {
    success: bool,
    user_id: String,
    revoked_at: String,
}

pub async fn admin_revoke(State(state): State<AdminState>, req: Request<Body>) -> Response {
    let path = req.uri().path().to_string();
    match handle(&state, req).await {
        Ok(response) => response,
        Err(err) => problem_response(&err, &path, None),
    }
}

async fn handle(state: &AdminState, req: Request<Body>) -> Result<Response, GatewayError> {
    if req.method() != axum::http::Method::POST {
        return Err(GatewayError::MethodNotAllowed(req.method().to_string()));
    }

    authenticate(state, &req)?;

    let body = axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|err| GatewayError::InvalidArgument {
            code: ValidationCode::BodyInvalidFormat,
            raw_message: format!("failed to read request body: {err}"),
        })?;

    let request: RevokeRequest =
        serde_json::from_slice(&body).map_err(|err| GatewayError::InvalidArgument {
            code: ValidationCode::BodyInvalidFormat,
            raw_message: format!("failed to parse request body: {err}"),
        })?;

    if request.user_id.is_empty() {
        return Err(GatewayError::InvalidArgument {
            code: ValidationCode::UserIdRequired,
            raw_message: "user_id missing or empty in revoke body".into(),
        });
    }

    let repo = state
        .sessions
        .clone()
        .ok_or(GatewayError::ServiceUnavailable)?;

    let revoked_at = write_revocation(repo, request.user_id.clone(), state.marker_ttl)
        .await
        .map_err(|err| GatewayError::system("failed to process revoke", err.to_string()))?;

    tracing::info!(
        user_id = %request.user_id,
        revoked_at = %revoked_at.to_rfc3339(),
        "user revoked by admin"
    );

    let body = RevokeResponse {
        success: true,
        user_id: request.user_id,
        revoked_at: revoked_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    };
    Ok((StatusCode::OK, axum::Json(body)).into_response())
}

fn authenticate(state: &AdminState, req: &Request<Body>) -> Result<(), GatewayError> {
    let provided = req
        .headers()
        .get(header::HeaderName::from_static("x-api-key"))
        .map(|v| v.as_bytes())
        .unwrap_or_default();

    if state.api_key.is_empty() || provided.ct_eq(state.api_key.as_bytes()).unwrap_u8() == 0 {
        return Err(GatewayError::Unauthorized(
            "invalid or missing API key".into(),
        ));
    }
    Ok(())
}
