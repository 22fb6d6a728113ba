//! Authentication primitives for the gate
//!
//! Provides:
//! - Session token verification (and minting, for renewal)
//! - The administrator/user role flag

pub mod jwt;
pub mod role;

pub use jwt::{unix_now, Claims, JwtValidator, TokenInput, VerifyError};
pub use role::Role;
