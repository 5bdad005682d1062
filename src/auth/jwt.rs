/// JWT Token Generation and Validation
///
/// Access and refresh tokens are HS256 JWTs signed with distinct secrets.
/// Validation uses no clock leeway: a token is good up to and including its
/// `exp` second.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, RefreshClaims};
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError};

fn validation(issuer: &str) -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[issuer]);
    validation.leeway = 0;
    validation
}

/// Sign an access token for a user
///
/// # Arguments
/// * `user_id` - User's UUID
/// * `username` - User's login name
/// * `expiry_seconds` - Lifetime of the token
/// * `config` - Auth configuration settings
pub fn generate_access_token(
    user_id: &Uuid,
    username: &str,
    expiry_seconds: i64,
    config: &AuthSettings,
) -> Result<String, AppError> {
    let claims = Claims::new(
        *user_id,
        username.to_string(),
        expiry_seconds,
        config.issuer.clone(),
    );
    encode_access_claims(&claims, config)
}

pub fn encode_access_claims(claims: &Claims, config: &AuthSettings) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(config.access_token_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Validate and extract claims from an access token
///
/// Signature mismatch, wrong issuer and expiry all map to `TokenInvalid`.
pub fn validate_access_token(token: &str, config: &AuthSettings) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.access_token_secret.as_bytes()),
        &validation(&config.issuer),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("Access token rejected: {}", e);
        AppError::Auth(AuthError::TokenInvalid)
    })
}

/// Sign a refresh token for a user
pub fn generate_refresh_token(user_id: &Uuid, config: &AuthSettings) -> Result<String, AppError> {
    let claims = RefreshClaims::new(*user_id, config.refresh_token_expiry, config.issuer.clone());
    encode_refresh_claims(&claims, config)
}

pub fn encode_refresh_claims(
    claims: &RefreshClaims,
    config: &AuthSettings,
) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(config.refresh_token_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Check a refresh token's signature, issuer and expiry
///
/// Returns `None` on any failure; callers collapse that into a single
/// forbidden response.
pub fn decode_refresh_token(token: &str, config: &AuthSettings) -> Option<RefreshClaims> {
    decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(config.refresh_token_secret.as_bytes()),
        &validation(&config.issuer),
    )
    .map(|data| data.claims)
    .map_err(|e| tracing::debug!("Refresh token rejected: {}", e))
    .ok()
}
