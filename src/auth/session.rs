/// Session lifecycle: issue, refresh, revoke
///
/// `SessionService` is the only component that touches both stores. Route
/// handlers translate HTTP in and out; everything with an invariant lives
/// here.

use std::sync::Arc;

use crate::auth::claims::Claims;
use crate::auth::jwt::{decode_refresh_token, generate_access_token, generate_refresh_token};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::refresh_token::{hash_token, new_record};
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError, ForbiddenError, ValidationError};
use crate::store::{Identity, RefreshTokenStore, UserStore};
use crate::validators::is_valid_username;

/// Token pair handed out at login or registration
#[derive(Debug, Clone)]
pub struct IssuedCredentials {
    pub access_token: String,
    pub refresh_token: String,
    pub identity: Identity,
}

/// Result of a successful rotation
#[derive(Debug, Clone)]
pub struct RefreshedCredentials {
    pub access_token: String,
    /// Stored server-side; only delivered to the client when
    /// `reissue_refresh_cookie` is enabled
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct SessionService {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn RefreshTokenStore>,
    config: AuthSettings,
}

impl SessionService {
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn RefreshTokenStore>,
        config: AuthSettings,
    ) -> Self {
        Self {
            users,
            tokens,
            config,
        }
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.config
    }

    /// Mint an access/refresh pair for a verified identity and store the
    /// refresh record.
    pub async fn issue(&self, identity: &Identity) -> Result<IssuedCredentials, AppError> {
        if identity.username.trim().is_empty() {
            return Err(ValidationError::InvalidFormat("identity".to_string()).into());
        }

        let access_token = generate_access_token(
            &identity.id,
            &identity.username,
            self.config.access_token_expiry,
            &self.config,
        )?;
        let refresh_token = generate_refresh_token(&identity.id, &self.config)?;

        self.tokens
            .create(new_record(
                &refresh_token,
                identity.id,
                self.config.refresh_token_expiry,
            ))
            .await?;

        Ok(IssuedCredentials {
            access_token,
            refresh_token,
            identity: identity.clone(),
        })
    }

    /// Create an identity with the default role and log it straight in
    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<IssuedCredentials, AppError> {
        let username = is_valid_username(username)?;

        if self.users.find_by_username(&username).await?.is_some() {
            return Err(AppError::Conflict("Username is already taken".to_string()));
        }

        let password_hash = self.hash(password).await?;
        let identity = self
            .users
            .create(Identity::new(username, password_hash))
            .await?;

        tracing::info!(user_id = %identity.id, "Identity created");

        self.issue(&identity).await
    }

    /// Check a username/password pair and issue credentials.
    ///
    /// Unknown user and wrong password produce the same error.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<IssuedCredentials, AppError> {
        let identity = self
            .users
            .find_by_username(username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.verify(password, &identity.password_hash).await? {
            return Err(AuthError::InvalidCredentials.into());
        }

        self.issue(&identity).await
    }

    /// Exchange a refresh token for a new access token, rotating the record.
    ///
    /// Every rejection after the cookie check is the same 403.
    pub async fn refresh(&self, presented: Option<&str>) -> Result<RefreshedCredentials, AppError> {
        let token = presented.ok_or(AuthError::MissingRefreshToken)?;
        let token_hash = hash_token(token);

        let record = match self.tokens.find_by_token_hash(&token_hash).await? {
            Some(record) => record,
            None => return Err(reject("unknown_token")),
        };

        let claims = decode_refresh_token(token, &self.config)
            .ok_or_else(|| reject("bad_signature_or_expired"))?;

        let user_id = match claims.user_id() {
            Some(id) if id == record.user_id => id,
            _ => return Err(reject("subject_mismatch")),
        };

        let identity = match self.users.find_by_id(user_id).await? {
            Some(identity) => identity,
            None => return Err(reject("unknown_identity")),
        };

        // A concurrent refresh may have consumed the record since the lookup
        if !self.tokens.delete_by_token_hash(&token_hash).await? {
            return Err(reject("lost_rotation_race"));
        }

        let refresh_token = generate_refresh_token(&identity.id, &self.config)?;
        self.tokens
            .create(new_record(
                &refresh_token,
                identity.id,
                self.config.refresh_token_expiry,
            ))
            .await?;

        let access_token = generate_access_token(
            &identity.id,
            &identity.username,
            self.config.refreshed_access_token_expiry,
            &self.config,
        )?;

        tracing::info!(user_id = %identity.id, "Refresh token rotated");

        Ok(RefreshedCredentials {
            access_token,
            refresh_token,
        })
    }

    /// Drop the refresh record for `presented`. Unknown tokens are fine.
    pub async fn logout(&self, presented: Option<&str>) -> Result<(), AppError> {
        let token = presented.ok_or(AuthError::MissingRefreshToken)?;
        let removed = self.tokens.delete_by_token_hash(&hash_token(token)).await?;

        tracing::info!(removed = removed, "Session revoked");
        Ok(())
    }

    /// Identity behind an already-validated access token
    pub async fn current_identity(&self, claims: &Claims) -> Result<Identity, AppError> {
        self.users
            .find_by_id(claims.user_id()?)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    async fn verify(&self, password: &str, password_hash: &str) -> Result<bool, AppError> {
        let password = password.to_string();
        let password_hash = password_hash.to_string();
        tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
    }

    async fn hash(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_string();
        let cost = self.config.password_hash_cost;
        tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
    }
}

fn reject(reason: &'static str) -> AppError {
    tracing::warn!(reason = reason, "Refresh rejected");
    ForbiddenError::RefreshTokenRejected.into()
}
