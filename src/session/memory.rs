//! In-process session repository.
//!
//! Backs tests and single-node development runs; production deployments use
//! the Redis implementation so revocation is visible to every gateway
//! replica.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::session::{SessionRepository, SessionStoreError};

#[derive(Debug, Default)]
pub struct MemorySessionRepository {
    // user_id → (revoked_at, expires_at)
    markers: RwLock<HashMap<String, (DateTime<Utc>, DateTime<Utc>)>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn set_revoked_time(
        &self,
        user_id: &str,
        revoked_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        if ttl <= Duration::zero() {
            return Ok(());
        }
        let mut markers = self.markers.write().await;
        markers.insert(user_id.to_string(), (revoked_at, Utc::now() + ttl));
        Ok(())
    }

    async fn get_revoked_time(
        &self,
        user_id: &str,
    ) -> Result<Option<DateTime<Utc>>, SessionStoreError> {
        let markers = self.markers.read().await;
        Ok(markers.get(user_id).and_then(|(revoked_at, expires_at)| {
            if *expires_at <= Utc::now() {
                None
            } else {
                Some(*revoked_at)
            }
        }))
    }

    async fn delete_revoked_time(&self, user_id: &str) -> Result<(), SessionStoreError> {
        let mut markers = self.markers.write().await;
        markers.remove(user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips_to_second_precision() {
        let repo = MemorySessionRepository::new();
        let instant = Utc::now();

        repo.set_revoked_time("u1", instant, Duration::hours(1))
            .await
            .unwrap();
        let stored = repo.get_revoked_time("u1").await.unwrap().unwrap();
        assert_eq!(stored.timestamp(), instant.timestamp());
    }

    #[tokio::test]
    async fn absent_marker_reads_as_none() {
        let repo = MemorySessionRepository::new();
        assert!(repo.get_revoked_time("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn non_positive_ttl_is_a_noop() {
        let repo = MemorySessionRepository::new();
        repo.set_revoked_time("u1", Utc::now(), Duration::zero())
            .await
            .unwrap();
        repo.set_revoked_time("u2", Utc::now(), Duration::seconds(-5))
            .await
            .unwrap();

        assert!(repo.get_revoked_time("u1").await.unwrap().is_none());
        assert!(repo.get_revoked_time("u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_marker_reads_as_absent() {
        let repo = MemorySessionRepository::new();
        repo.set_revoked_time("u1", Utc::now(), Duration::milliseconds(20))
            .await
            .unwrap();

        assert!(repo.get_revoked_time("u1").await.unwrap().is_some());
        tokio::time::sleep(std::time::Duration::from_millis(40)).await;
        assert!(repo.get_revoked_time("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let repo = MemorySessionRepository::new();
        repo.set_revoked_time("u1", Utc::now(), Duration::hours(1))
            .await
            .unwrap();

        repo.delete_revoked_time("u1").await.unwrap();
        repo.delete_revoked_time("u1").await.unwrap();
        assert!(repo.get_revoked_time("u1").await.unwrap().is_none());
    }
}
