//! Account roles carried in session tokens

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role flag embedded in every session token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum Role {
    /// Job seeker or recruiter account
    #[default]
    User = 0,
    /// Platform administrator reviewing candidates and postings
    Admin = 1,
}

impl Role {
    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "USER"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}
