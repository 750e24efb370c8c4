//! Unified error type for netgo, and its HTTP rendering.
//!
//! [`NetgoError`] wraps each crate's error so the server and the binary
//! deal with one type. [`ApiError`] is what a handler returns: a kind that
//! picks the status code, a client-safe message, and optional details.
//!
//! Response body:
//!
//! ```json
//! { "error": { "type": "NOTFOUND", "message": "resource: game with value: 7 not found" } }
//! ```
//!
//! Validation failures add `"invalidArgs": [{ "field", "value", "tag", "param" }]`.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use netgo_game::GameError;
use netgo_hub::HubError;
use netgo_protocol::ProtocolError;
use netgo_session::SessionError;
use serde::{Deserialize, Serialize};

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum NetgoError {
    /// A malformed wire value.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Authentication or account failure.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The subscription hub refused work.
    #[error(transparent)]
    Hub(#[from] HubError),

    /// A game operation failed.
    #[error(transparent)]
    Game(#[from] GameError),

    /// A configuration value did not parse.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Binding or serving failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Error category, serialized as the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ErrorKind {
    Authorization,
    Forbidden,
    BadRequest,
    NotFound,
    Conflict,
    Timeout,
    Unavailable,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            Self::Authorization => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// One rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidArgument {
    pub field: String,
    pub value: String,
    pub tag: String,
    pub param: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: ErrorKind,
    message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope {
    error: ErrorBody,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    invalid_args: Vec<InvalidArgument>,
}

/// An error response.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    pub invalid_args: Vec<InvalidArgument>,
    /// Seconds for a `Retry-After` header.
    pub retry_after: Option<u64>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            invalid_args: Vec::new(),
            retry_after: None,
        }
    }

    pub fn unauthenticated() -> Self {
        Self::new(ErrorKind::Authorization, "Provided session is invalid")
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, reason)
    }

    pub fn bad_request(reason: impl std::fmt::Display) -> Self {
        Self::new(ErrorKind::BadRequest, format!("Bad request. Reason: {reason}"))
    }

    pub fn invalid_args(args: Vec<InvalidArgument>) -> Self {
        Self {
            invalid_args: args,
            ..Self::bad_request("Invalid request parameters")
        }
    }

    pub fn not_found(resource: &str, value: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::NotFound,
            format!("resource: {resource} with value: {value} not found"),
        )
    }

    pub fn conflict(resource: &str, value: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::Conflict,
            format!("resource: {resource} with value: {value} already exists"),
        )
    }

    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout, "request timed out")
    }

    /// 503 with a `Retry-After` hint.
    pub fn unavailable(retry_after_secs: u64) -> Self {
        Self {
            retry_after: Some(retry_after_secs),
            ..Self::new(ErrorKind::Unavailable, "server is shutting down")
        }
    }

    /// 500. `detail` is logged and never sent.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "internal server error");
        Self::new(ErrorKind::Internal, "Internal server error.")
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorEnvelope {
            error: ErrorBody {
                kind: self.kind,
                message: self.message,
            },
            invalid_args: self.invalid_args,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = self.retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Unauthenticated => Self::unauthenticated(),
            // Unknown user and wrong password both land here.
            SessionError::InvalidLogin(name) => Self::not_found("user", name),
            SessionError::UsernameTaken(name) => Self::conflict("user", name),
            e @ (SessionError::UnknownUser(_) | SessionError::Hashing(_)) => Self::internal(e),
        }
    }
}

impl From<GameError> for ApiError {
    fn from(e: GameError) -> Self {
        match e {
            GameError::NotFound(id) => Self::not_found("game", id.0),
            e @ GameError::NotParticipant { .. } => Self::forbidden(e.to_string()),
            GameError::SeatMismatch(reason) => Self::forbidden(reason),
            GameError::Invalid(reason) => Self::bad_request(reason),
            GameError::OpponentNotFound(name) => Self::not_found("user", name),
            GameError::Protocol(e) => Self::bad_request(e),
            e @ GameError::Store(_) => Self::internal(e),
        }
    }
}

impl From<NetgoError> for ApiError {
    fn from(e: NetgoError) -> Self {
        match e {
            NetgoError::Protocol(e) => Self::bad_request(e),
            NetgoError::Session(e) => e.into(),
            NetgoError::Game(e) => e.into(),
            NetgoError::Hub(HubError::Closed) => Self::unavailable(1),
            e @ (NetgoError::Config(_) | NetgoError::Io(_)) => Self::internal(e),
        }
    }
}
