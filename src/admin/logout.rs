//! User-initiated logout.
//!
//! `DELETE /logout` reads the caller's bearer token, extracts the user id,
//! and writes a revocation marker dated now. Every token issued to that
//! user before this instant is dead, on every gateway replica, as soon as
//! the store write lands.

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::admin::{claims, AdminState};
use crate::error::GatewayError;
use crate::http::problem::problem_response;
use crate::middleware::auth::extract_bearer;
use crate::session::write_revocation;

pub async fn logout(State(state): State<AdminState>, req: Request<Body>) -> Response {
    let path = req.uri().path().to_string();
    match handle(&state, req).await {
        Ok(response) => response,
        Err(err) => problem_response(&err, &path, None),
    }
}

async fn handle(state: &AdminState, req: Request<Body>) -> Result<Response, GatewayError> {
    if req.method() != axum::http::Method::DELETE {
        return Err(GatewayError::MethodNotAllowed(req.method().to_string()));
    }

    let (parts, _body) = req.into_parts();
    let token = extract_bearer(&parts)?;
    let token_claims = claims::decode_unverified(token)?;
    let user_id = claims::user_id(&token_claims, &state.user_id_claim)?;

    let repo = state
        .sessions
        .clone()
        .ok_or(GatewayError::ServiceUnavailable)?;

    let revoked_at = write_revocation(repo, user_id.clone(), state.marker_ttl)
        .await
        .map_err(|err| {
            GatewayError::system("failed to process logout", err.to_string())
        })?;

    tracing::info!(
        user_id = %user_id,
        revoked_at = %revoked_at.to_rfc3339(),
        "user logged out"
    );

    Ok(StatusCode::NO_CONTENT.into_response())
}
