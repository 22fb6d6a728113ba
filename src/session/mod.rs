//! Session refresh collaborator
//!
//! Non-API requests hand the session cookie to a [`SessionRefresher`] without
//! looking at it. The refresher decides whether the session is worth renewing
//! and, if so, hands back a `Set-Cookie` value for the outgoing response.

pub mod refresher;

pub use refresher::{format_session_cookie, JwtSessionRefresher};

use async_trait::async_trait;

use crate::types::GateError;

/// What the refresher wants done to the outgoing response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Leave the response alone
    Unchanged,
    /// Attach a renewed session cookie
    Renewed {
        /// Full `Set-Cookie` header value
        cookie: String,
        /// Expiry of the new token (Unix timestamp)
        expires_at: u64,
    },
}

#[async_trait]
pub trait SessionRefresher: Send + Sync {
    /// Inspect the current session cookie, renewing it if needed
    async fn refresh(&self, token: Option<&str>) -> Result<SessionOutcome, GateError>;
}
