//! recruit-gate - request admission for the recruitment platform
//!
//! Sits in front of page and API handlers and decides, per request, whether
//! to reject it, pass it through, or pass it through after renewing the
//! session cookie.
//!
//! ## Pieces
//!
//! - **Gate**: origin allow-list and CORS for the API, session refresh elsewhere
//! - **Token status**: "is this session still usable" with an expiry lookahead
//! - **Session**: JWT-backed refresher that renews near-expiry cookies
//! - **Server**: hyper HTTP/1 server routing everything through the gate

pub mod auth;
pub mod config;
pub mod gate;
pub mod routes;
pub mod server;
pub mod session;
pub mod types;

pub use config::{Args, GateConfig};
pub use gate::{Decision, Gate};
pub use server::{run, AppState};
pub use types::{GateError, Result};
