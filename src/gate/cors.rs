//! Origin allow-list and CORS header synthesis for the protected API

use hyper::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, VARY,
};

use crate::config::GateConfig;
use crate::gate::RequestMeta;
use crate::types::GateError;

pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization, X-CSRF-Token";
pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// CORS headers granted to one allowed origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsHeaders {
    origin: HeaderValue,
    max_age_secs: u64,
}

impl CorsHeaders {
    pub fn origin(&self) -> &HeaderValue {
        &self.origin
    }

    /// Write the grant onto a response, replacing any CORS headers the handler
    /// set. `Vary: Origin` is appended to existing `Vary` values.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.origin.clone());
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from(self.max_age_secs));
        headers.append(VARY, HeaderValue::from_static("Origin"));
    }
}

/// Strict set-membership check of the request origin against the allow-list.
///
/// The matching origin is echoed back exactly as received, never as `*`.
pub fn check_origin(config: &GateConfig, meta: &RequestMeta) -> Result<CorsHeaders, GateError> {
    let origin = meta.origin_str();

    match (origin, &meta.origin) {
        (Some(o), Some(raw)) if config.allowed_origins().contains(&o) => Ok(CorsHeaders {
            origin: raw.clone(),
            max_age_secs: config.preflight_max_age_secs,
        }),
        _ => Err(GateError::OriginNotAllowed(origin.map(str::to_string))),
    }
}
