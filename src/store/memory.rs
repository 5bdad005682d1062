//! In-process stores backed by `tokio::sync::RwLock` maps.
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Identity, RefreshTokenRecord, RefreshTokenStore, UserStore};
use crate::error::{AppError, DatabaseError};

#[derive(Default)]
struct Users {
    by_id: HashMap<Uuid, Identity>,
    id_by_username: HashMap<String, Uuid>,
}

#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    inner: Arc<RwLock<Users>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, identity: Identity) -> Result<Identity, AppError> {
        let mut users = self.inner.write().await;
        if users.id_by_username.contains_key(&identity.username) {
            return Err(DatabaseError::UniqueConstraintViolation(format!(
                "username {}",
                identity.username
            ))
            .into());
        }
        users
            .id_by_username
            .insert(identity.username.clone(), identity.id);
        users.by_id.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AppError> {
        let users = self.inner.read().await;
        Ok(users
            .id_by_username
            .get(username)
            .and_then(|id| users.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, AppError> {
        Ok(self.inner.read().await.by_id.get(&id).cloned())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryRefreshTokenStore {
    records: Arc<RwLock<HashMap<String, RefreshTokenRecord>>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn create(&self, record: RefreshTokenRecord) -> Result<(), AppError> {
        let mut records = self.records.write().await;

        let now = Utc::now();
        records.retain(|_, existing| !existing.is_expired(now));

        if records.contains_key(&record.token_hash) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "refresh token already stored".to_string(),
            )
            .into());
        }
        records.insert(record.token_hash.clone(), record);
        Ok(())
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, AppError> {
        Ok(self.records.read().await.get(token_hash).cloned())
    }

    async fn delete_by_token_hash(&self, token_hash: &str) -> Result<bool, AppError> {
        Ok(self.records.write().await.remove(token_hash).is_some())
    }
}
