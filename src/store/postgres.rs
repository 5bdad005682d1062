use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Identity, RefreshTokenRecord, RefreshTokenStore, Role, UserStore};
use crate::error::{AppError, DatabaseError};

type UserRow = (Uuid, String, String, String, DateTime<Utc>);

fn identity_from_row(row: UserRow) -> Result<Identity, AppError> {
    let (id, username, password_hash, role, created_at) = row;
    let role = role.parse::<Role>().map_err(|_| {
        AppError::Database(DatabaseError::UnexpectedError(format!(
            "unknown role {:?} stored for user {}",
            role, id
        )))
    })?;

    Ok(Identity {
        id,
        username,
        password_hash,
        role,
        created_at,
    })
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, identity: Identity) -> Result<Identity, AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(identity.id)
        .bind(&identity.username)
        .bind(&identity.password_hash)
        .bind(identity.role.as_str())
        .bind(identity.created_at)
        .execute(&self.pool)
        .await?;

        Ok(identity)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AppError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, role, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .map(identity_from_row)
        .transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, AppError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(identity_from_row)
        .transpose()
    }
}

#[derive(Clone)]
pub struct PgRefreshTokenStore {
    pool: PgPool,
}

impl PgRefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    async fn create(&self, record: RefreshTokenRecord) -> Result<(), AppError> {
        let pruned = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < $1")
            .bind(record.created_at)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if pruned > 0 {
            tracing::debug!(pruned, "Expired refresh tokens removed");
        }

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token_hash, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&record.token_hash)
        .bind(record.user_id)
        .bind(record.created_at)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, AppError> {
        let row = sqlx::query_as::<_, (String, Uuid, DateTime<Utc>, DateTime<Utc>)>(
            r#"
            SELECT token_hash, user_id, created_at, expires_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(
            row.map(|(token_hash, user_id, created_at, expires_at)| RefreshTokenRecord {
                token_hash,
                user_id,
                created_at,
                expires_at,
            }),
        )
    }

    async fn delete_by_token_hash(&self, token_hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
