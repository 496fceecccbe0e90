//! Session repository: revocation markers in a shared key-value store.
//!
//! A marker is one entry per user id holding the UTC instant before which
//! every issued token is invalid. Markers carry a TTL equal to the maximum
//! token lifetime so they self-evict once they can no longer affect any
//! live token.

pub mod memory;
pub mod redis;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

pub use memory::MemorySessionRepository;
pub use redis::RedisSessionRepository;

/// Failures talking to the session store.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session store call failed: {0}")]
    Backend(#[from] ::redis::RedisError),

    #[error("session store call timed out")]
    Timeout,

    #[error("stored revocation marker for user {user_id} is not RFC3339: {value}")]
    CorruptMarker { user_id: String, value: String },

    #[error("revocation write task failed: {0}")]
    Task(String),
}

/// Contract for revocation marker storage.
///
/// Every call may run concurrently with any other; implementations must not
/// cache results across calls.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Record that tokens issued before `revoked_at` are invalid for
    /// `user_id`. A non-positive `ttl` is a successful no-op: such a marker
    /// could not outlive any token it affects.
    async fn set_revoked_time(
        &self,
        user_id: &str,
        revoked_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<(), SessionStoreError>;

    /// Fetch the revocation marker for `user_id`. `None` means never
    /// revoked (or the marker expired).
    async fn get_revoked_time(
        &self,
        user_id: &str,
    ) -> Result<Option<DateTime<Utc>>, SessionStoreError>;

    /// Remove the marker for `user_id`. Idempotent.
    async fn delete_revoked_time(&self, user_id: &str) -> Result<(), SessionStoreError>;
}

/// Write a revocation marker dated now.
///
/// Shared by the logout and forced-revoke handlers; the two HTTP surfaces
/// stay distinct, the store-write semantics are one.
///
/// The write runs on a detached task: a logout that reached the store
/// completes even if the client disconnects and the caller is dropped.
pub async fn write_revocation(
    repo: Arc<dyn SessionRepository>,
    user_id: String,
    ttl: Duration,
) -> Result<DateTime<Utc>, SessionStoreError> {
    let revoked_at = Utc::now();
    let write = tokio::spawn(async move { repo.set_revoked_time(&user_id, revoked_at, ttl).await });
    write
        .await
        .map_err(|e| SessionStoreError::Task(e.to_string()))??;
    Ok(revoked_at)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_revocation_stamps_now_and_stores() {
        let repo = Arc::new(MemorySessionRepository::new());
        let before = Utc::now();

        let revoked_at = write_revocation(repo.clone(), "u1".into(), Duration::hours(10))
            .await
            .unwrap();

        assert!(revoked_at >= before && revoked_at <= Utc::now());
        let stored = repo.get_revoked_time("u1").await.unwrap().unwrap();
        assert_eq!(stored.timestamp(), revoked_at.timestamp());
    }
}
