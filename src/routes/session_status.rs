//! GET {api}/auth/session - is the caller's session token still usable?
//!
//! 200 with the token's subject and role, or 401 with one of
//! `UNAUTHENTICATED`, `INVALID_TOKEN`, `EXPIRING_SOON`.

use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::debug;

use crate::auth::unix_now;
use crate::gate::{Gate, RequestMeta};
use crate::server::response::{json_response, BoxBody};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub valid: bool,
    pub subject: String,
    pub role: String,
    pub admin: bool,
    pub expires_at: u64,
    pub expires_in: u64,
}

pub fn handle_session_status(gate: &Gate, meta: &RequestMeta) -> Response<BoxBody> {
    match gate.token_status(meta.session_token.as_deref()) {
        Ok(claims) => json_response(
            StatusCode::OK,
            &SessionStatusResponse {
                valid: true,
                subject: claims.sub.clone(),
                role: claims.role.to_string(),
                admin: claims.is_admin(),
                expires_at: claims.exp,
                expires_in: claims.seconds_remaining(unix_now()).max(0) as u64,
            },
        ),
        Err(err) => {
            debug!("Session status: {}", err);
            err.into_response()
        }
    }
}
