//! Session token signing and verification
//!
//! Session cookies carry an HS256 (HMAC-SHA256) JWT. The gate only ever
//! verifies them; new tokens are minted here solely for session renewal.
//!
//! Verification uses zero leeway: a token whose `exp` has passed is invalid
//! no matter how recently it expired.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::Role;
use crate::types::GateError;

/// Secret used when running in development mode without `JWT_SECRET`
const DEV_SECRET: &str = "dev-mode-secret-not-for-production-use-123456";

/// Minimum accepted length of a production signing secret
pub const MIN_SECRET_LEN: usize = 32;

/// Payload stored in a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account identifier
    pub sub: String,
    /// Administrator vs standard user
    #[serde(default)]
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Seconds left until expiry, negative once expired
    pub fn seconds_remaining(&self, now: u64) -> i64 {
        to_i64(self.exp).saturating_sub(to_i64(now))
    }
}

/// Input for minting a token
#[derive(Debug, Clone)]
pub struct TokenInput {
    pub subject: String,
    pub role: Role,
}

impl From<&Claims> for TokenInput {
    fn from(claims: &Claims) -> Self {
        Self {
            subject: claims.sub.clone(),
            role: claims.role,
        }
    }
}

/// Why a token failed verification
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("token expired")]
    Expired,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("malformed token: {0}")]
    Malformed(String),
}

impl From<jsonwebtoken::errors::Error> for VerifyError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            _ => Self::Malformed(err.to_string()),
        }
    }
}

/// Clamp a Unix timestamp or duration into `i64`
pub(crate) fn to_i64(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}

/// Current Unix time in seconds
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// JWT validator and generator
#[derive(Clone)]
pub struct JwtValidator {
    secret: String,
    expiry_seconds: u64,
}

impl std::fmt::Debug for JwtValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtValidator")
            .field("expiry_seconds", &self.expiry_seconds)
            .finish_non_exhaustive()
    }
}

impl JwtValidator {
    /// Create a new JWT validator
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(secret: String, expiry_seconds: u64) -> Result<Self, GateError> {
        if secret.is_empty() {
            return Err(GateError::Config(
                "JWT_SECRET is required in production mode".into(),
            ));
        }

        if secret.len() < MIN_SECRET_LEN {
            return Err(GateError::Config(format!(
                "JWT_SECRET must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }

        Ok(Self {
            secret,
            expiry_seconds,
        })
    }

    /// Create a validator for dev mode
    pub fn new_dev(expiry_seconds: u64) -> Self {
        Self {
            secret: DEV_SECRET.into(),
            expiry_seconds,
        }
    }

    /// Lifetime of freshly minted tokens
    pub fn expiry_seconds(&self) -> u64 {
        self.expiry_seconds
    }

    /// Expiry of a token minted at `now` with the configured lifetime
    pub fn expires_at(&self, now: u64) -> Result<u64, GateError> {
        now.checked_add(self.expiry_seconds)
            .filter(|exp| i64::try_from(*exp).is_ok())
            .ok_or_else(|| {
                GateError::Config(format!(
                    "Token lifetime of {}s is out of range",
                    self.expiry_seconds
                ))
            })
    }

    /// Mint a token valid for the configured lifetime starting now
    pub fn generate_token(&self, input: TokenInput) -> Result<String, GateError> {
        let now = unix_now();
        self.issue_token(input, now, self.expires_at(now)?)
    }

    /// Mint a token with explicit issue and expiry times
    pub fn issue_token(
        &self,
        input: TokenInput,
        issued_at: u64,
        expires_at: u64,
    ) -> Result<String, GateError> {
        let claims = Claims {
            sub: input.subject,
            role: input.role,
            iat: issued_at,
            exp: expires_at,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| GateError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Verify signature and expiry, returning the decoded claims
    pub fn verify_token(&self, token: &str) -> Result<Claims, VerifyError> {
        self.verify_token_at(token, unix_now())
    }

    /// Verify against an explicit clock. A token is expired once `exp <= now`.
    pub fn verify_token_at(&self, token: &str, now: u64) -> Result<Claims, VerifyError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // Expiry is checked below against `now`, not the system clock
        validation.validate_exp = false;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )?;

        if data.claims.exp <= now {
            return Err(VerifyError::Expired);
        }

        Ok(data.claims)
    }
}
