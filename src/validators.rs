/// Input validators for credentials
///
/// Usernames are compared exactly on login, so registration normalises
/// them once (trim) and refuses anything that would not survive a
/// round-trip through a login form.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_USERNAME_LENGTH: usize = 64;

lazy_static! {
    // Any printable character except whitespace
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[^\s\p{Cc}]+$").unwrap();
}

/// Validates a username and returns it trimmed
/// - Non-empty after trimming
/// - At most 64 characters
/// - No inner whitespace or control characters
pub fn is_valid_username(username: &str) -> Result<String, ValidationError> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("username".to_string()));
    }

    if trimmed.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong(
            "username".to_string(),
            MAX_USERNAME_LENGTH,
        ));
    }

    if !USERNAME_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("username".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Pulls both credential fields out of a request body
///
/// Missing or empty fields yield the same 400 message the frontend expects.
pub fn require_credentials(
    username: Option<&str>,
    password: Option<&str>,
) -> Result<(String, String), ValidationError> {
    match (username, password) {
        (Some(u), Some(p)) if !u.trim().is_empty() && !p.is_empty() => {
            Ok((u.to_string(), p.to_string()))
        }
        _ => Err(ValidationError::MissingFields(
            "username and password are required".to_string(),
        )),
    }
}
