//! Gateway error taxonomy.
//!
//! Every error that escapes the request pipeline is one of the kinds below.
//! The HTTP status projection and the Problem Details writer
//! (`http::problem`) are the only places that interpret a kind; handlers and
//! stages construct values and never write status codes themselves.

use axum::http::StatusCode;
use thiserror::Error;

/// Validation error code selecting a user-facing message.
///
/// The raw backend message stays in the error value for logs; the code is
/// what picks the text shown to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCode {
    UserIdRequired,
    BodyRequired,
    BodyInvalidFormat,
    ParameterInvalid,
    Unknown,
}

impl ValidationCode {
    /// Stable wire identifier, e.g. `user_id.required`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCode::UserIdRequired => "user_id.required",
            ValidationCode::BodyRequired => "body.required",
            ValidationCode::BodyInvalidFormat => "body.invalid_format",
            ValidationCode::ParameterInvalid => "parameter.invalid",
            ValidationCode::Unknown => "validation.unknown",
        }
    }

    /// User-safe message for this code.
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationCode::UserIdRequired => "user_id is required",
            ValidationCode::BodyRequired => "request body is required",
            ValidationCode::BodyInvalidFormat => "invalid request body",
            ValidationCode::ParameterInvalid => "invalid parameter",
            ValidationCode::Unknown => "invalid request",
        }
    }
}

/// Closed set of error kinds produced by the gateway pipeline.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Client input failed validation. The raw message is log-only.
    #[error("{}", .code.user_message())]
    InvalidArgument {
        code: ValidationCode,
        raw_message: String,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unprocessable(String),

    /// Internal failure. `user_message` is safe for clients; `detail_message`
    /// is log-only.
    #[error("{user_message}")]
    System {
        user_message: String,
        detail_message: String,
    },

    #[error("no route found for path: {0}")]
    RoutingNotFound(String),

    #[error("method {0} not allowed")]
    MethodNotAllowed(String),

    /// Upstream call failed before or during the exchange. The location tag
    /// correlates log lines; neither it nor the cause reach the client.
    #[error("upstream request failed at {location}")]
    TransportFailure {
        location: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("upstream deadline exceeded")]
    GatewayTimeout,

    #[error("session service unavailable")]
    ServiceUnavailable,
}

impl GatewayError {
    pub fn system(user_message: impl Into<String>, detail_message: impl Into<String>) -> Self {
        GatewayError::System {
            user_message: user_message.into(),
            detail_message: detail_message.into(),
        }
    }

    pub fn transport(
        location: &'static str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        GatewayError::TransportFailure {
            location,
            source: Box::new(source),
        }
    }

    /// HTTP status for this kind. Single point of truth.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            GatewayError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GatewayError::Forbidden(_) => StatusCode::FORBIDDEN,
            GatewayError::NotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::Conflict(_) => StatusCode::CONFLICT,
            GatewayError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::System { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::RoutingNotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::TransportFailure { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// User-safe detail for the Problem Details body.
    ///
    /// Falls back to the status title when a kind has nothing safe to say
    /// beyond it.
    pub fn detail(&self) -> String {
        match self {
            GatewayError::TransportFailure { .. } => default_title(self.status()).to_string(),
            GatewayError::RoutingNotFound(_) => "no matching route".to_string(),
            GatewayError::MethodNotAllowed(method) => {
                format!("method {method} is not allowed for this route")
            }
            other => other.to_string(),
        }
    }

    /// Log-only description, including internals the client never sees.
    pub fn raw_message(&self) -> Option<String> {
        match self {
            GatewayError::InvalidArgument { raw_message, .. } => Some(raw_message.clone()),
            GatewayError::System { detail_message, .. } => Some(detail_message.clone()),
            GatewayError::TransportFailure { location, source } => {
                Some(format!("{location}: {source}"))
            }
            _ => None,
        }
    }
}

/// Default title for a status code. This table is the localization point.
pub fn default_title(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "Invalid request",
        StatusCode::UNAUTHORIZED => "Authentication required",
        StatusCode::FORBIDDEN => "Access denied",
        StatusCode::NOT_FOUND => "Resource not found",
        StatusCode::METHOD_NOT_ALLOWED => "Method not allowed",
        StatusCode::CONFLICT => "Request conflict",
        StatusCode::UNPROCESSABLE_ENTITY => "Unprocessable request",
        StatusCode::INTERNAL_SERVER_ERROR => "Internal server error",
        StatusCode::BAD_GATEWAY => "Bad gateway",
        StatusCode::SERVICE_UNAVAILABLE => "Service unavailable",
        StatusCode::GATEWAY_TIMEOUT => "Gateway timeout",
        _ => "Error",
    }
}
