/// Refresh Token Records
///
/// Refresh tokens are signed JWTs, but a valid signature is not enough:
/// the token must also have a live record in the refresh-token store.
/// Records hold the SHA-256 of the token, never the token itself.

use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::store::RefreshTokenRecord;

/// Hash a refresh token using SHA-256
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Build the store record that binds `token` to `user_id`
///
/// `expires_at` sits one second past the token's lifetime: a JWT stays
/// valid through its whole `exp` second, and the record must outlive it.
pub fn new_record(token: &str, user_id: Uuid, lifetime_seconds: i64) -> RefreshTokenRecord {
    let created_at = Utc::now();
    RefreshTokenRecord {
        token_hash: hash_token(token),
        user_id,
        created_at,
        expires_at: created_at + Duration::seconds(lifetime_seconds + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_hashing() {
        let hash1 = hash_token("some.refresh.token");
        let hash2 = hash_token("some.refresh.token");

        assert_eq!(hash1, hash2);
        assert_ne!("some.refresh.token", hash1);
        // SHA-256 hex
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_tokens_different_hashes() {
        assert_ne!(hash_token("token-one"), hash_token("token-two"));
    }

    #[test]
    fn test_new_record_binds_user() {
        let user_id = Uuid::new_v4();
        let record = new_record("abc", user_id, 604_800);

        assert_eq!(record.user_id, user_id);
        assert_eq!(record.token_hash, hash_token("abc"));
        assert_eq!(
            record.expires_at - record.created_at,
            Duration::seconds(604_801)
        );
    }
}
