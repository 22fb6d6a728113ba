//! Health and version endpoints
//!
//! - /health, /healthz - Liveness probe
//! - /version - Build information for deployment verification

use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::config::GateConfig;
use crate::server::response::{json_response, BoxBody};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    pub commit: &'static str,
    /// development or production
    pub mode: &'static str,
    /// Whether the API allow-list has any member
    pub api_origin_configured: bool,
    pub timestamp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    pub version: &'static str,
    pub commit: &'static str,
    pub commit_full: &'static str,
    pub build_time: &'static str,
    pub service: &'static str,
}

/// Liveness probe: always 200 while the process is serving
pub fn health_check(config: &GateConfig) -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &HealthResponse {
            healthy: true,
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
            mode: config.mode.as_str(),
            api_origin_configured: !config.allowed_origins().is_empty(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        },
    )
}

pub fn version_info() -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &VersionResponse {
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
            commit_full: option_env!("GIT_COMMIT_FULL").unwrap_or("unknown"),
            build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
            service: "recruit-gate",
        },
    )
}
