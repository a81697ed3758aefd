//! Redis-backed storage
//!
//! This module provides a thin Redis connection wrapper and the Redis
//! implementation of the session store and instance registry. Records are
//! stored as JSON strings under `session:<id>` and `app:<instance url>`.

use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use tracing::{debug, info, warn};

use crate::{
    error::{StoreError, StoreResult},
    models::{RegisteredApp, Session},
    repository::{AppRepository, SessionRepository},
};

/// Configuration for Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
}

impl RedisConfig {
    /// Create a new RedisConfig from environment variables
    ///
    /// # Environment Variables
    /// - `REDIS_URL`: Redis connection URL (default: "redis://localhost:6379")
    pub fn from_env() -> StoreResult<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        Ok(RedisConfig { url })
    }
}

/// Redis connection handle
#[derive(Clone)]
pub struct RedisPool {
    client: Client,
}

impl RedisPool {
    /// Open a Redis client for the configured URL
    pub fn new(config: &RedisConfig) -> StoreResult<Self> {
        let client = Client::open(config.url.clone())?;
        info!("Redis client initialized with URL: {}", config.url);
        Ok(RedisPool { client })
    }

    async fn get_connection(&self) -> StoreResult<redis::aio::MultiplexedConnection> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn)
    }

    /// Set a key-value pair, replacing any previous value
    pub async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.get_connection().await?;
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    /// Set a key only if it does not exist yet; returns whether it was written
    pub async fn set_nx(&self, key: &str, value: &str) -> StoreResult<bool> {
        let mut conn = self.get_connection().await?;
        let written: bool = conn.set_nx(key, value).await?;
        Ok(written)
    }

    /// Get a value from Redis by key
    pub async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    /// Delete a key from Redis
    pub async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.get_connection().await?;
        let _: u64 = conn.del(key).await?;
        Ok(())
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> StoreResult<bool> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}

/// Redis session store and instance registry
#[derive(Clone)]
pub struct RedisStore {
    pool: RedisPool,
}

impl RedisStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    fn session_key(session_id: &str) -> String {
        format!("session:{}", session_id)
    }

    fn app_key(instance_url: &str) -> String {
        format!("app:{}", instance_url)
    }
}

#[async_trait]
impl SessionRepository for RedisStore {
    async fn get(&self, session_id: &str) -> StoreResult<Session> {
        let raw = self
            .pool
            .get(&Self::session_key(session_id))
            .await?
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn add(&self, session: &Session) -> StoreResult<()> {
        debug!("Storing session for instance: {}", session.instance_url);
        let raw = serde_json::to_string(session)?;
        self.pool.set(&Self::session_key(&session.id), &raw).await
    }
}

#[async_trait]
impl AppRepository for RedisStore {
    async fn get(&self, instance_url: &str) -> StoreResult<RegisteredApp> {
        let raw = self
            .pool
            .get(&Self::app_key(instance_url))
            .await?
            .ok_or_else(|| StoreError::AppNotFound(instance_url.to_string()))?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn add(&self, app: &RegisteredApp) -> StoreResult<()> {
        let raw = serde_json::to_string(app)?;
        if !self.pool.set_nx(&Self::app_key(&app.instance_url), &raw).await? {
            warn!("App already registered for instance: {}", app.instance_url);
            return Err(StoreError::Conflict(app.instance_url.clone()));
        }
        debug!("Stored app for instance: {}", app.instance_url);
        Ok(())
    }
}
