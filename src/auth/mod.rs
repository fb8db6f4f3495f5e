//! Authentication and authorization module
//!
//! Provides JWT-based authentication and role-based access control.

mod jwt;
mod middleware;
mod password;
pub mod policy;

pub use jwt::{create_token, decode_token, Claims};
pub use middleware::auth_middleware;
pub use password::{hash_password, verify_login, verify_password};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User roles for authorization
///
/// Closed set; parsed and normalized once at the boundary (token decode,
/// request parsing, database reads). Never compared as raw strings downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Unrestricted cross-country visibility and full role-assignment rights
    Superadmin,
    /// Pinned to one country; manages OPERATOR users within it
    CountryAdmin,
    /// Pinned to one country, no administrative rights over other users
    Operator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "SUPERADMIN",
            Role::CountryAdmin => "COUNTRY_ADMIN",
            Role::Operator => "OPERATOR",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    /// Case-insensitive; historical rows mix casing.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SUPERADMIN" => Ok(Role::Superadmin),
            "COUNTRY_ADMIN" => Ok(Role::CountryAdmin),
            "OPERATOR" => Ok(Role::Operator),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verified request identity, decoded from the bearer token.
///
/// Constructed once per request by the auth middleware and immutable for the
/// request's lifetime. `country_id` is `None` only for SUPERADMIN accounts;
/// a missing country on any other role fails closed at scope resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i32,
    pub role: Role,
    pub country_id: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!("superadmin".parse::<Role>().unwrap(), Role::Superadmin);
        assert_eq!("Country_Admin".parse::<Role>().unwrap(), Role::CountryAdmin);
        assert_eq!("OPERATOR".parse::<Role>().unwrap(), Role::Operator);
    }

    #[test]
    fn role_parsing_rejects_unknown_tokens() {
        assert!("ADMIN".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_as_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&Role::CountryAdmin).unwrap(),
            "\"COUNTRY_ADMIN\""
        );
        let parsed: Role = serde_json::from_str("\"SUPERADMIN\"").unwrap();
        assert_eq!(parsed, Role::Superadmin);
    }

    #[test]
    fn role_round_trips_through_as_str() {
        for role in [Role::Superadmin, Role::CountryAdmin, Role::Operator] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }
}
