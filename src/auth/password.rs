//! Password hashing and verification
//!
//! Uses bcrypt for secure password hashing.

use crate::error::AppError;
use bcrypt::{hash, verify, DEFAULT_COST};
use once_cell::sync::Lazy;

/// Hash verified when the looked-up account does not exist, so the
/// missing-user and wrong-password login paths take comparable time.
static DUMMY_HASH: Lazy<String> =
    Lazy::new(|| hash("loandesk-timing-pad", DEFAULT_COST).unwrap_or_default());

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Failed to verify password: {}", e)))
}

/// Check login credentials against an optional stored hash.
///
/// Returns the same `InvalidCredentials` error whether the account is absent
/// or the password is wrong; the absent path still pays for one bcrypt
/// verification against [`DUMMY_HASH`].
pub fn verify_login(candidate: &str, stored_hash: Option<&str>) -> Result<(), AppError> {
    match stored_hash {
        Some(stored) => {
            if verify_password(candidate, stored)? {
                Ok(())
            } else {
                Err(AppError::InvalidCredentials)
            }
        }
        None => {
            let _ = verify(candidate, &DUMMY_HASH);
            Err(AppError::InvalidCredentials)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hashed = hash_password("tryandbuy2024").unwrap();
        assert!(verify_password("tryandbuy2024", &hashed).unwrap());
        assert!(!verify_password("tryandbuy2025", &hashed).unwrap());
    }

    #[test]
    fn verify_login_accepts_matching_password() {
        let hashed = hash_password("correct horse").unwrap();
        assert!(verify_login("correct horse", Some(&hashed)).is_ok());
    }

    #[test]
    fn missing_account_and_wrong_password_fail_identically() {
        let hashed = hash_password("right-password").unwrap();

        let wrong = verify_login("wrong-password", Some(&hashed)).unwrap_err();
        let absent = verify_login("wrong-password", None).unwrap_err();

        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert!(matches!(absent, AppError::InvalidCredentials));
    }
}
