//! Redis-backed session repository.
//!
//! Markers live under `<prefix><user_id>` as RFC3339 strings with a
//! server-side TTL, so eviction needs no sweeper.

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::config::RedisConfig;
use crate::session::{SessionRepository, SessionStoreError};

#[derive(Clone)]
pub struct RedisSessionRepository {
    conn: ConnectionManager,
    key_prefix: String,
    op_timeout: std::time::Duration,
}

impl RedisSessionRepository {
    /// Connect to the configured server and verify the connection with a
    /// ping. A failed ping is reported as a warning, not a startup failure:
    /// the store may come up after the gateway.
    pub async fn connect(cfg: &RedisConfig) -> Result<Self, SessionStoreError> {
        let (host, port) = match cfg.host.rsplit_once(':') {
            Some((host, port)) => (host.to_string(), port.parse().unwrap_or(6379)),
            None => (cfg.host.clone(), 6379),
        };

        let info = redis::ConnectionInfo {
            addr: redis::ConnectionAddr::Tcp(host, port),
            redis: redis::RedisConnectionInfo {
                db: cfg.db,
                username: None,
                password: if cfg.password.is_empty() {
                    None
                } else {
                    Some(cfg.password.clone())
                },
                ..Default::default()
            },
        };

        let client = redis::Client::open(info)?;
        let conn = tokio::time::timeout(
            std::time::Duration::from_secs(cfg.connect_timeout_secs),
            ConnectionManager::new(client),
        )
        .await
        .map_err(|_| SessionStoreError::Timeout)??;

        let repo = Self {
            conn,
            key_prefix: cfg.key_prefix.clone(),
            op_timeout: std::time::Duration::from_secs(cfg.read_timeout_secs.max(1)),
        };

        let mut ping_conn = repo.conn.clone();
        match redis::cmd("PING").query_async::<String>(&mut ping_conn).await {
            Ok(_) => tracing::info!("session store connected"),
            Err(error) => tracing::warn!(%error, "session store ping failed"),
        }

        Ok(repo)
    }

    fn key(&self, user_id: &str) -> String {
        format!("{}{}", self.key_prefix, user_id)
    }

    async fn with_timeout<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, redis::RedisError>>,
    ) -> Result<T, SessionStoreError> {
        tokio::time::timeout(self.op_timeout, fut)
            .await
            .map_err(|_| SessionStoreError::Timeout)?
            .map_err(SessionStoreError::from)
    }
}

#[async_trait]
impl SessionRepository for RedisSessionRepository {
    async fn set_revoked_time(
        &self,
        user_id: &str,
        revoked_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        // A marker that would expire immediately cannot affect any live
        // token; writing it would leave the store with a pointless key.
        if ttl <= Duration::zero() {
            return Ok(());
        }

        let key = self.key(user_id);
        let value = revoked_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        let seconds = ttl.num_seconds() as u64;

        let mut conn = self.conn.clone();
        self.with_timeout(async move { conn.set_ex::<_, _, ()>(&key, value, seconds).await })
            .await
    }

    async fn get_revoked_time(
        &self,
        user_id: &str,
    ) -> Result<Option<DateTime<Utc>>, SessionStoreError> {
        let key = self.key(user_id);
        let mut conn = self.conn.clone();
        let value: Option<String> = self
            .with_timeout(async move { conn.get(&key).await })
            .await?;

        match value {
            None => Ok(None),
            Some(raw) => {
                let parsed = DateTime::parse_from_rfc3339(&raw).map_err(|_| {
                    SessionStoreError::CorruptMarker {
                        user_id: user_id.to_string(),
                        value: raw.clone(),
                    }
                })?;
                Ok(Some(parsed.with_timezone(&Utc)))
            }
        }
    }

    async fn delete_revoked_time(&self, user_id: &str) -> Result<(), SessionStoreError> {
        let key = self.key(user_id);
        let mut conn = self.conn.clone();
        self.with_timeout(async move { conn.del::<_, ()>(&key).await })
            .await
    }
}
