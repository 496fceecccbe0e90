//! RFC 9457 Problem Details writer.
//!
//! The single place that turns a `GatewayError` into an HTTP response. The
//! client sees `{type, title, status, detail, instance}` as
//! `application/problem+json`; the server log line additionally carries the
//! raw error, which never leaves the process.

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use serde::Serialize;

use crate::error::{default_title, GatewayError};

pub const CONTENT_TYPE_PROBLEM: &str = "application/problem+json";

/// RFC 9457 body.
#[derive(Debug, Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub instance: String,
}

impl ProblemDetails {
    pub fn from_error(err: &GatewayError, instance: &str) -> Self {
        let status = err.status();
        let title = default_title(status).to_string();
        let mut detail = err.detail();
        if detail.is_empty() {
            detail = title.clone();
        }

        Self {
            kind: "about:blank",
            title,
            status: status.as_u16(),
            detail,
            instance: instance.to_string(),
        }
    }
}

/// Build the error response and write the matching server-side log line.
///
/// 5xx errors log at error with the full source chain; 4xx log at warn with
/// the problem object only.
pub fn problem_response(err: &GatewayError, instance: &str, request_id: Option<&str>) -> Response {
    let problem = ProblemDetails::from_error(err, instance);
    let status =
        StatusCode::from_u16(problem.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let raw = err.raw_message().unwrap_or_default();
    if status.is_server_error() {
        tracing::error!(
            request_id = request_id.unwrap_or_default(),
            status = problem.status,
            title = %problem.title,
            detail = %problem.detail,
            instance = %problem.instance,
            raw_err = %raw,
            source = ?err,
            "request failed"
        );
    } else {
        tracing::warn!(
            request_id = request_id.unwrap_or_default(),
            status = problem.status,
            title = %problem.title,
            detail = %problem.detail,
            instance = %problem.instance,
            raw_err = %raw,
            "request failed"
        );
    }

    let body = serde_json::to_vec(&problem).unwrap_or_else(|_| b"{}".to_vec());
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(CONTENT_TYPE_PROBLEM),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationCode;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn body_has_all_rfc9457_members() {
        let err = GatewayError::Unauthorized("token has been revoked".into());
        let response = problem_response(&err, "/api/v1/users", None);

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            CONTENT_TYPE_PROBLEM
        );

        let body = body_json(response).await;
        assert_eq!(body["type"], "about:blank");
        assert_eq!(body["title"], "Authentication required");
        assert_eq!(body["status"], 401);
        assert_eq!(body["detail"], "token has been revoked");
        assert_eq!(body["instance"], "/api/v1/users");
    }

    #[tokio::test]
    async fn internal_detail_never_reaches_the_client() {
        let err = GatewayError::system(
            "An unexpected error occurred",
            "panic at src/secret.rs:42 with /etc/passwd open",
        );
        let response = problem_response(&err, "/x", Some("req-1"));
        let body = body_json(response).await;

        let serialized = body.to_string();
        assert!(!serialized.contains("secret.rs"));
        assert!(!serialized.contains("/etc/passwd"));
        assert_eq!(body["detail"], "An unexpected error occurred");
    }

    #[tokio::test]
    async fn validation_detail_comes_from_the_code_table() {
        let err = GatewayError::InvalidArgument {
            code: ValidationCode::UserIdRequired,
            raw_message: "decoder said: field `user_id` absent".into(),
        };
        let response = problem_response(&err, "/revoke", None);
        let body = body_json(response).await;

        assert_eq!(body["status"], 400);
        assert_eq!(body["detail"], "user_id is required");
        assert!(!body.to_string().contains("decoder said"));
    }

    #[tokio::test]
    async fn transport_and_timeout_statuses() {
        let transport = GatewayError::transport(
            "proxy_request",
            std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"),
        );
        assert_eq!(
            problem_response(&transport, "/x", None).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            problem_response(&GatewayError::GatewayTimeout, "/x", None).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}
