//! HTTP routes behind the gate

pub mod health;
pub mod session_status;

pub use health::{health_check, version_info};
pub use session_status::handle_session_status;

use hyper::{Method, Request, Response, StatusCode};

use crate::gate::{Gate, RequestMeta};
use crate::server::response::{json_response, not_found_response, BoxBody};

/// Dispatch a request the gate has already admitted
pub fn dispatch<B>(gate: &Gate, req: &Request<B>) -> Response<BoxBody> {
    let config = gate.config();
    let meta = RequestMeta::from_request(req, &config.session_cookie);
    let session_path = format!("{}/auth/session", config.api_prefix);

    match (req.method(), meta.path.as_str()) {
        (&Method::GET, "/health") | (&Method::GET, "/healthz") => health_check(config),
        (&Method::GET, "/version") => version_info(),
        (&Method::GET, p) if p == session_path => handle_session_status(gate, &meta),
        (_, p) if p == session_path => json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &serde_json::json!({ "error": "Method not allowed" }),
        ),
        (_, p) => not_found_response(p),
    }
}
