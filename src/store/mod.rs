/// Identity and refresh-token persistence
///
/// The session core only talks to these two traits. `memory` backs tests
/// and single-process deployments; `postgres` is the durable backend.

mod memory;
mod postgres;

pub use memory::{InMemoryRefreshTokenStore, InMemoryUserStore};
pub use postgres::{PgRefreshTokenStore, PgUserStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AppError, ValidationError};

/// Fixed set of roles an identity can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
    Manager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Manager => "manager",
        }
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            _ => Err(ValidationError::InvalidFormat("role".to_string())),
        }
    }
}

/// A registered user
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// Build a fresh identity from an already-hashed password
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            password_hash,
            role: Role::default(),
            created_at: Utc::now(),
        }
    }
}

/// Server-side record of one outstanding refresh token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    /// SHA-256 hex digest of the token string
    pub token_hash: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    /// After this instant the token can no longer pass verification and the
    /// record may be pruned
    pub expires_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new identity; a taken username is a unique-constraint error
    async fn create(&self, identity: Identity) -> Result<Identity, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, AppError>;
}

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Store a record. Implementations also drop expired records here.
    async fn create(&self, record: RefreshTokenRecord) -> Result<(), AppError>;

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, AppError>;

    /// Remove the record; returns whether a record was actually removed
    async fn delete_by_token_hash(&self, token_hash: &str) -> Result<bool, AppError>;
}
