//! Redis-backed session store
//!
//! Holds the per-actor ranking preference (lane, energy) with a fixed TTL.
//!
//! Cache keys follow the pattern:
//! - session:{actor_id} → serialized `Session`
//!
//! Concurrent updates for the same actor are last-write-wins: a single
//! `SETEX` replaces the whole record.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::Session;

/// Minimal key-value surface the session store needs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
}

/// `KeyValueCache` over a shared Redis connection manager
#[derive(Clone)]
pub struct RedisCache {
    client: Arc<ConnectionManager>,
}

impl RedisCache {
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| AppError::Cache(format!("Failed to create Redis client: {}", e)))?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Cache(format!("Failed to create Redis connection: {}", e)))?;

        Ok(Self {
            client: Arc::new(manager),
        })
    }

    /// Ping Redis to check connection health
    pub async fn ping(&self) -> Result<()> {
        redis::cmd("PING")
            .query_async::<_, String>(&mut self.client.as_ref().clone())
            .await
            .map_err(|e| {
                warn!("Redis PING failed: {}", e);
                AppError::Cache(format!("Redis health check failed: {}", e))
            })?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut self.client.as_ref().clone())
            .await
            .map_err(|e| {
                warn!("Redis GET failed for {}: {}", key, e);
                AppError::Cache(format!("Redis error: {}", e))
            })?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        redis::cmd("SETEX")
            .arg(key)
            .arg(ttl.as_secs().max(1))
            .arg(value)
            .query_async::<_, ()>(&mut self.client.as_ref().clone())
            .await
            .map_err(|e| {
                warn!("Redis SETEX failed for {}: {}", key, e);
                AppError::Cache(format!("Redis error: {}", e))
            })?;
        Ok(())
    }
}

/// Per-actor session preferences on top of a `KeyValueCache`
#[derive(Clone)]
pub struct SessionStore {
    cache: Arc<dyn KeyValueCache>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(cache: Arc<dyn KeyValueCache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    fn key(actor_id: Uuid) -> String {
        format!("session:{}", actor_id)
    }

    /// Overwrite the actor's session and restart its TTL
    pub async fn put(&self, actor_id: Uuid, session: &Session) -> Result<()> {
        let json = serde_json::to_string(session)?;
        self.cache.set(&Self::key(actor_id), &json, self.ttl).await?;

        debug!(
            actor_id = %actor_id,
            ttl_secs = self.ttl.as_secs(),
            "Session stored"
        );
        Ok(())
    }

    /// Stored session, or an empty preference when absent or expired
    pub async fn get(&self, actor_id: Uuid) -> Result<Session> {
        match self.cache.get(&Self::key(actor_id)).await? {
            Some(json) => {
                let session = serde_json::from_str::<Session>(&json).map_err(|e| {
                    AppError::Cache(format!("Session deserialization failed: {}", e))
                })?;
                Ok(session)
            }
            None => Ok(Session::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[test]
    fn test_session_key_format() {
        let id = Uuid::nil();
        assert_eq!(
            SessionStore::key(id),
            "session:00000000-0000-0000-0000-000000000000"
        );
    }

    #[tokio::test]
    async fn test_put_uses_configured_ttl() {
        let actor = Uuid::new_v4();
        let mut cache = MockKeyValueCache::new();
        cache
            .expect_set()
            .withf(move |key, value, ttl| {
                key == format!("session:{}", actor)
                    && value.contains("debate")
                    && *ttl == Duration::from_secs(86_400)
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let store = SessionStore::new(Arc::new(cache), Duration::from_secs(86_400));
        let session = Session::from_raw(Some("debate"), Some("intense"));
        store.put(actor, &session).await.unwrap();
    }

    #[tokio::test]
    async fn test_absent_session_is_empty() {
        let actor = Uuid::new_v4();
        let mut cache = MockKeyValueCache::new();
        cache
            .expect_get()
            .with(eq(format!("session:{}", actor)))
            .returning(|_| Ok(None));

        let store = SessionStore::new(Arc::new(cache), Duration::from_secs(60));
        assert!(store.get(actor).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stored_session_roundtrip() {
        let mut cache = MockKeyValueCache::new();
        cache
            .expect_get()
            .returning(|_| Ok(Some(r#"{"lane":"vibe","energy":null}"#.to_string())));

        let store = SessionStore::new(Arc::new(cache), Duration::from_secs(60));
        let session = store.get(Uuid::new_v4()).await.unwrap();
        assert_eq!(session.lane.as_deref(), Some("vibe"));
        assert_eq!(session.energy, None);
    }

    #[tokio::test]
    async fn test_corrupt_session_is_an_error() {
        let mut cache = MockKeyValueCache::new();
        cache
            .expect_get()
            .returning(|_| Ok(Some("{not json".to_string())));

        let store = SessionStore::new(Arc::new(cache), Duration::from_secs(60));
        assert!(matches!(
            store.get(Uuid::new_v4()).await,
            Err(AppError::Cache(_))
        ));
    }
}
