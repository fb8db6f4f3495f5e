//! JWT token management
//!
//! Handles creation and validation of session tokens.
//!
//! Tokens are the sole source of identity: role and country claims are
//! embedded at issuance and trusted until expiry, so a role or country change
//! takes effect on the next login, not retroactively on already-issued tokens.
//! There is no revocation list; the fixed lifetime is the only bound on a
//! token's validity. Both are accepted limitations of the stateless design.

use crate::auth::{Identity, Role};
use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// JWT secret key (should be from environment in production)
static JWT_SECRET: Lazy<String> = Lazy::new(|| {
    std::env::var("JWT_SECRET")
        .unwrap_or_else(|_| "loandesk-dev-secret-key-change-in-production".to_string())
});

/// Session token lifetime
const TOKEN_EXPIRATION_DAYS: i64 = 7;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: i32,
    /// User email
    pub email: String,
    /// User role
    pub role: Role,
    /// Country the account is pinned to; absent for SUPERADMIN
    pub country_id: Option<i32>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl Claims {
    /// The verified identity carried by these claims.
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.sub,
            role: self.role,
            country_id: self.country_id,
        }
    }
}

/// Create a signed session token for a user
pub fn create_token(
    user_id: i32,
    email: &str,
    role: Role,
    country_id: Option<i32>,
) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        role,
        country_id,
        exp: (now + Duration::days(TOKEN_EXPIRATION_DAYS)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
}

/// Decode and validate a session token
///
/// Expired, tampered, and malformed tokens are indistinguishable to the
/// caller; the concrete reason goes to the debug log only.
pub fn decode_token(token: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(JWT_SECRET.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("Token rejected: {:?}", e.kind());
        AppError::Unauthenticated
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn token_round_trips_claims() {
        let token = create_token(7, "admin@loandesk.io", Role::CountryAdmin, Some(3)).unwrap();
        let claims = decode_token(&token).unwrap();

        assert_eq!(claims.sub, 7);
        assert_eq!(claims.email, "admin@loandesk.io");
        assert_eq!(claims.role, Role::CountryAdmin);
        assert_eq!(claims.country_id, Some(3));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn repeated_issuance_decodes_to_the_same_identity() {
        let first = create_token(12, "op@loandesk.io", Role::Operator, Some(1)).unwrap();
        let second = create_token(12, "op@loandesk.io", Role::Operator, Some(1)).unwrap();

        let a = decode_token(&first).unwrap().identity();
        let b = decode_token(&second).unwrap().identity();
        assert_eq!(a, b);
        assert_eq!(a.id, 12);
        assert_eq!(a.country_id, Some(1));
    }

    #[test]
    fn superadmin_token_carries_no_country() {
        let token = create_token(1, "root@loandesk.io", Role::Superadmin, None).unwrap();
        let identity = decode_token(&token).unwrap().identity();
        assert_eq!(identity.role, Role::Superadmin);
        assert_eq!(identity.country_id, None);
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now();
        let claims = Claims {
            sub: 5,
            email: "old@loandesk.io".to_string(),
            role: Role::Operator,
            country_id: Some(2),
            exp: (now - Duration::hours(2)).timestamp(),
            iat: (now - Duration::days(8)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            decode_token(&token),
            Err(AppError::Unauthenticated)
        ));
    }

    #[test]
    fn token_signed_with_wrong_secret_is_rejected() {
        let now = Utc::now();
        let claims = Claims {
            sub: 5,
            email: "forged@loandesk.io".to_string(),
            role: Role::Superadmin,
            country_id: None,
            exp: (now + Duration::days(1)).timestamp(),
            iat: now.timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"some-other-secret"),
        )
        .unwrap();

        assert!(matches!(
            decode_token(&token),
            Err(AppError::Unauthenticated)
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(matches!(
            decode_token("not-a-jwt"),
            Err(AppError::Unauthenticated)
        ));
    }
}
