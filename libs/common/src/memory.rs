//! In-process store backend
//!
//! Holds sessions and registered applications in two maps behind async
//! locks. Data is lost on restart; useful for development and tests.

use std::{
    collections::{HashMap, hash_map::Entry},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::{
    error::{StoreError, StoreResult},
    models::{RegisteredApp, Session},
    repository::{AppRepository, SessionRepository},
};

/// Memory-backed session store and instance registry
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    apps: Arc<RwLock<HashMap<String, RegisteredApp>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Number of registered applications
    pub async fn app_count(&self) -> usize {
        self.apps.read().await.len()
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn get(&self, session_id: &str) -> StoreResult<Session> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))
    }

    async fn add(&self, session: &Session) -> StoreResult<()> {
        debug!("Storing session for instance: {}", session.instance_url);
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(())
    }
}

#[async_trait]
impl AppRepository for MemoryStore {
    async fn get(&self, instance_url: &str) -> StoreResult<RegisteredApp> {
        self.apps
            .read()
            .await
            .get(instance_url)
            .cloned()
            .ok_or_else(|| StoreError::AppNotFound(instance_url.to_string()))
    }

    async fn add(&self, app: &RegisteredApp) -> StoreResult<()> {
        match self.apps.write().await.entry(app.instance_url.clone()) {
            Entry::Occupied(_) => {
                warn!("App already registered for instance: {}", app.instance_url);
                Err(StoreError::Conflict(app.instance_url.clone()))
            }
            Entry::Vacant(slot) => {
                debug!("Storing app for instance: {}", app.instance_url);
                slot.insert(app.clone());
                Ok(())
            }
        }
    }
}
