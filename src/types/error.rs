//! Error types for the request gate

use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::auth::VerifyError;
use crate::server::response::{json_response, BoxBody};

/// Every way a request can be turned away by the gate or its collaborators
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Origin not allowed: {}", .0.as_deref().unwrap_or("<none>"))]
    OriginNotAllowed(Option<String>),

    #[error("No session token presented")]
    Unauthenticated,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] VerifyError),

    #[error("Token expires in {expires_in}s")]
    ExpiringSoon { expires_in: u64 },

    #[error("Session refresh failed: {0}")]
    SessionRefresh(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON payload carried by every rejection
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

impl GateError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::OriginNotAllowed(_) => StatusCode::FORBIDDEN,
            Self::Unauthenticated | Self::InvalidToken(_) | Self::ExpiringSoon { .. } => {
                StatusCode::UNAUTHORIZED
            }
            Self::SessionRefresh(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code for clients
    pub fn code(&self) -> &'static str {
        match self {
            Self::OriginNotAllowed(_) => "ORIGIN_NOT_ALLOWED",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InvalidToken(_) => "INVALID_TOKEN",
            Self::ExpiringSoon { .. } => "EXPIRING_SOON",
            Self::SessionRefresh(_) => "SESSION_REFRESH_FAILED",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            code: self.code(),
        }
    }

    /// Render as a JSON error response. Carries no CORS headers.
    pub fn into_response(self) -> Response<BoxBody> {
        json_response(self.status_code(), &self.body())
    }
}

impl From<std::io::Error> for GateError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result type alias for gate operations
pub type Result<T> = std::result::Result<T, GateError>;
