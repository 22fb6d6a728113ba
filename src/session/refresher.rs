//! JWT-backed session refresher

use async_trait::async_trait;
use tracing::{debug, info};

use crate::auth::jwt::to_i64;
use crate::auth::{unix_now, JwtValidator, TokenInput};
use crate::config::ExecutionMode;
use crate::session::{SessionOutcome, SessionRefresher};
use crate::types::GateError;

/// Renews session tokens that are valid but inside the refresh window.
///
/// Missing or unreadable cookies are left untouched; downstream handlers decide
/// what an unauthenticated request gets.
pub struct JwtSessionRefresher {
    jwt: JwtValidator,
    cookie_name: String,
    refresh_window_secs: u64,
    secure: bool,
}

impl JwtSessionRefresher {
    pub fn new(
        jwt: JwtValidator,
        cookie_name: impl Into<String>,
        refresh_window_secs: u64,
        mode: ExecutionMode,
    ) -> Self {
        Self {
            jwt,
            cookie_name: cookie_name.into(),
            refresh_window_secs,
            secure: mode == ExecutionMode::Production,
        }
    }

    /// Decide against an explicit clock
    pub fn refresh_at(&self, token: Option<&str>, now: u64) -> Result<SessionOutcome, GateError> {
        let Some(token) = token else {
            return Ok(SessionOutcome::Unchanged);
        };

        let claims = match self.jwt.verify_token_at(token, now) {
            Ok(claims) => claims,
            Err(e) => {
                debug!("Session cookie not renewable: {}", e);
                return Ok(SessionOutcome::Unchanged);
            }
        };

        if claims.seconds_remaining(now) >= to_i64(self.refresh_window_secs) {
            return Ok(SessionOutcome::Unchanged);
        }

        let expires_at = self
            .jwt
            .expires_at(now)
            .map_err(|e| GateError::SessionRefresh(e.to_string()))?;
        let renewed = self
            .jwt
            .issue_token(TokenInput::from(&claims), now, expires_at)
            .map_err(|e| GateError::SessionRefresh(e.to_string()))?;

        info!(subject = %claims.sub, expires_at, "Session renewed");

        Ok(SessionOutcome::Renewed {
            cookie: format_session_cookie(
                &self.cookie_name,
                &renewed,
                self.jwt.expiry_seconds(),
                self.secure,
            ),
            expires_at,
        })
    }
}

#[async_trait]
impl SessionRefresher for JwtSessionRefresher {
    async fn refresh(&self, token: Option<&str>) -> Result<SessionOutcome, GateError> {
        self.refresh_at(token, unix_now())
    }
}

/// `Set-Cookie` value for a session token
pub fn format_session_cookie(name: &str, token: &str, max_age_secs: u64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
