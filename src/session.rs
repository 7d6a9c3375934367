//! Operator session
//!
//! Session issuance lives in the backend; the desk only needs to know who
//! is at the keyboard and whether they may rearrange seating.

use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Operator,
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "operator" => Ok(Role::Operator),
            other => Err(format!("Invalid role: {}. Use admin or operator", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Role::Admin => "admin",
            Role::Operator => "operator",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: String,
    pub role: Role,
}

impl Session {
    pub fn new(user: impl Into<String>, role: Role) -> Self {
        Self {
            user: user.into(),
            role,
        }
    }

    pub fn admin(user: impl Into<String>) -> Self {
        Self::new(user, Role::Admin)
    }

    pub fn operator(user: impl Into<String>) -> Self {
        Self::new(user, Role::Operator)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
