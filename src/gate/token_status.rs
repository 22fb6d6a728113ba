//! "Is this token still usable" query
//!
//! A token that verifies but expires within the lookahead window is reported
//! as [`GateError::ExpiringSoon`], so clients refresh before a real request
//! fails mid-flight.

use crate::auth::jwt::to_i64;
use crate::auth::{Claims, JwtValidator};
use crate::types::GateError;

/// Classify a session token against `now` (Unix seconds).
///
/// Absence is always `Unauthenticated`; verification is never attempted
/// without a token. Both expiry and the lookahead are measured from `now`.
pub fn token_status(
    jwt: &JwtValidator,
    token: Option<&str>,
    lookahead_secs: u64,
    now: u64,
) -> Result<Claims, GateError> {
    let token = token.ok_or(GateError::Unauthenticated)?;
    let claims = jwt.verify_token_at(token, now)?;

    let remaining = claims.seconds_remaining(now);
    if remaining < to_i64(lookahead_secs) {
        return Err(GateError::ExpiringSoon {
            expires_in: remaining.max(0) as u64,
        });
    }

    Ok(claims)
}
