//! Configuration for the gate
//!
//! CLI arguments and environment variables via clap. `Args` is parsed once at
//! startup and turned into the immutable [`GateConfig`] the gate reads on
//! every request.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;

use crate::auth::jwt::MIN_SECRET_LEN;
use crate::auth::JwtValidator;
use crate::types::GateError;

/// The only origin allowed to call the API in development mode
pub const DEV_ORIGIN: &str = "http://localhost:3000";

/// Tokens closer than this to expiry are reported as unusable
pub const DEFAULT_EXPIRY_LOOKAHEAD_SECS: u64 = 15 * 60;

/// How long browsers may cache a preflight answer (one day)
pub const DEFAULT_PREFLIGHT_MAX_AGE_SECS: u64 = 24 * 60 * 60;

/// Upper bound for the token lookahead and the refresh window
pub const MAX_WINDOW_SECS: u64 = 24 * 60 * 60;

/// Upper bound for the lifetime of a renewed session token (one year)
pub const MAX_JWT_EXPIRY_SECS: u64 = 365 * 24 * 60 * 60;

/// Path prefix of the protected API surface
pub const DEFAULT_API_PREFIX: &str = "/api";

/// recruit-gate - request admission for the recruitment platform
#[derive(Parser, Debug, Clone)]
#[command(name = "recruit-gate")]
#[command(about = "Origin policy, CORS and session refresh in front of the recruitment platform")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (localhost origin, default signing secret)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Public origin of the site, the only origin allowed in production
    #[arg(long, env = "SITE_URL")]
    pub site_url: Option<String>,

    /// Secret for session token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Lifetime of renewed session tokens in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "3600")]
    pub jwt_expiry_seconds: u64,

    /// Name of the session cookie
    #[arg(long, env = "SESSION_COOKIE", default_value = "session")]
    pub session_cookie: String,

    /// Renew session cookies with less than this many seconds left
    #[arg(long, env = "SESSION_REFRESH_WINDOW_SECS", default_value_t = DEFAULT_EXPIRY_LOOKAHEAD_SECS)]
    pub session_refresh_window_secs: u64,

    /// Token-status lookahead: tokens expiring sooner are treated as unusable
    #[arg(long, env = "TOKEN_LOOKAHEAD_SECS", default_value_t = DEFAULT_EXPIRY_LOOKAHEAD_SECS)]
    pub token_lookahead_secs: u64,

    /// Access-Control-Max-Age sent with CORS responses
    #[arg(long, env = "PREFLIGHT_MAX_AGE_SECS", default_value_t = DEFAULT_PREFLIGHT_MAX_AGE_SECS)]
    pub preflight_max_age_secs: u64,

    /// Path prefix of the protected API
    #[arg(long, env = "API_PREFIX", default_value = DEFAULT_API_PREFIX)]
    pub api_prefix: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Development vs production
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Development,
    Production,
}

impl ExecutionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionMode::Development => "development",
            ExecutionMode::Production => "production",
        }
    }
}

impl Args {
    pub fn mode(&self) -> ExecutionMode {
        if self.dev_mode {
            ExecutionMode::Development
        } else {
            ExecutionMode::Production
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            match &self.jwt_secret {
                None => return Err("JWT_SECRET is required in production mode".to_string()),
                Some(s) if s.len() < MIN_SECRET_LEN => {
                    return Err(format!(
                        "JWT_SECRET must be at least {} characters",
                        MIN_SECRET_LEN
                    ))
                }
                Some(_) => {}
            }
        }

        if self.jwt_expiry_seconds == 0 || self.jwt_expiry_seconds > MAX_JWT_EXPIRY_SECS {
            return Err(format!(
                "JWT_EXPIRY_SECONDS must be between 1 and {}",
                MAX_JWT_EXPIRY_SECS
            ));
        }

        for (name, value) in [
            ("TOKEN_LOOKAHEAD_SECS", self.token_lookahead_secs),
            ("SESSION_REFRESH_WINDOW_SECS", self.session_refresh_window_secs),
        ] {
            if value == 0 || value > MAX_WINDOW_SECS {
                return Err(format!("{} must be between 1 and {}", name, MAX_WINDOW_SECS));
            }
        }

        if self.session_refresh_window_secs >= self.jwt_expiry_seconds {
            return Err(
                "SESSION_REFRESH_WINDOW_SECS must be shorter than JWT_EXPIRY_SECONDS".to_string(),
            );
        }

        if !self.api_prefix.starts_with('/') {
            return Err("API_PREFIX must start with '/'".to_string());
        }

        if self.session_cookie.is_empty() || self.session_cookie.contains([';', '=', ' ']) {
            return Err("SESSION_COOKIE must be a plain cookie name".to_string());
        }

        Ok(())
    }

    /// Build the validator for the configured secret (dev default in dev mode)
    pub fn jwt_validator(&self) -> Result<JwtValidator, GateError> {
        match (&self.jwt_secret, self.dev_mode) {
            (Some(secret), _) => JwtValidator::new(secret.clone(), self.jwt_expiry_seconds),
            (None, true) => Ok(JwtValidator::new_dev(self.jwt_expiry_seconds)),
            (None, false) => Err(GateError::Config(
                "JWT_SECRET is required in production mode".into(),
            )),
        }
    }
}

/// Immutable gate configuration, built once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    pub mode: ExecutionMode,
    /// Configured production origin, if any
    pub site_origin: Option<String>,
    pub api_prefix: String,
    pub session_cookie: String,
    pub expiry_lookahead_secs: u64,
    pub preflight_max_age_secs: u64,
}

impl GateConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            mode: args.mode(),
            site_origin: args
                .site_url
                .as_deref()
                .map(|s| s.trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty()),
            api_prefix: args.api_prefix.trim_end_matches('/').to_string(),
            session_cookie: args.session_cookie.clone(),
            expiry_lookahead_secs: args.token_lookahead_secs,
            preflight_max_age_secs: args.preflight_max_age_secs,
        }
    }

    /// Config with the default policy constants
    pub fn new(mode: ExecutionMode, site_origin: Option<String>) -> Self {
        Self {
            mode,
            site_origin,
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            session_cookie: "session".to_string(),
            expiry_lookahead_secs: DEFAULT_EXPIRY_LOOKAHEAD_SECS,
            preflight_max_age_secs: DEFAULT_PREFLIGHT_MAX_AGE_SECS,
        }
    }

    /// Origins permitted to call the API. Empty in production without a site origin.
    pub fn allowed_origins(&self) -> Vec<&str> {
        match self.mode {
            ExecutionMode::Development => vec![DEV_ORIGIN],
            ExecutionMode::Production => self.site_origin.as_deref().into_iter().collect(),
        }
    }

    /// Whether `path` belongs to the protected API surface
    pub fn is_api_path(&self, path: &str) -> bool {
        match path.strip_prefix(self.api_prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}
