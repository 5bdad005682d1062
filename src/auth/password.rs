/// Password Hashing and Verification
///
/// bcrypt with a configurable work factor.

use bcrypt::{hash, verify};

use crate::error::{AppError, ValidationError};

/// bcrypt only looks at the first 72 bytes of its input
const MAX_PASSWORD_BYTES: usize = 72;

/// Hash a password using bcrypt
///
/// # Errors
/// Returns a validation error for empty or over-long passwords, and an
/// internal error if bcrypt itself fails.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    validate_password(password)?;

    hash(password, cost).map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_BYTES,
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = crate::configuration::MIN_BCRYPT_COST;

    #[test]
    fn test_hash_password() {
        let hash = hash_password("secret1", TEST_COST).expect("Failed to hash password");

        assert_ne!("secret1", hash);
        assert!(hash.starts_with("$2"));
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let first = hash_password("secret1", TEST_COST).unwrap();
        let second = hash_password("secret1", TEST_COST).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("secret1", TEST_COST).unwrap();

        assert!(verify_password("secret1", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_empty_password_rejected() {
        assert!(matches!(
            hash_password("", TEST_COST),
            Err(AppError::Validation(ValidationError::EmptyField(_)))
        ));
    }

    #[test]
    fn test_too_long_password_rejected() {
        let long_password = "a".repeat(MAX_PASSWORD_BYTES + 1);
        assert!(matches!(
            hash_password(&long_password, TEST_COST),
            Err(AppError::Validation(ValidationError::TooLong(_, _)))
        ));
    }

    #[test]
    fn test_verify_against_garbage_hash_is_error() {
        assert!(verify_password("secret1", "not-a-bcrypt-hash").is_err());
    }
}
