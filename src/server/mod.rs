//! HTTP server

pub mod http;
pub mod response;

pub use http::{handle, run, AppState};
