//! Key-value repository interfaces for sessions and registered applications
//!
//! Every backend honours the same contract:
//! - `SessionRepository::add` creates or overwrites by `Session::id`.
//! - `AppRepository::add` is first-write-wins: a second `add` for an
//!   instance URL that is already registered fails with
//!   [`StoreError::Conflict`](crate::error::StoreError::Conflict) and leaves
//!   the stored credentials untouched.

use async_trait::async_trait;

use crate::{
    error::StoreResult,
    models::{RegisteredApp, Session},
};

/// Session store keyed by session id
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Fetch a session, failing with `SessionNotFound` on a miss
    async fn get(&self, session_id: &str) -> StoreResult<Session>;

    /// Insert or overwrite a session
    async fn add(&self, session: &Session) -> StoreResult<()>;
}

/// Instance registry keyed by instance base URL
#[async_trait]
pub trait AppRepository: Send + Sync {
    /// Fetch the credentials for an instance, failing with `AppNotFound` on a miss
    async fn get(&self, instance_url: &str) -> StoreResult<RegisteredApp>;

    /// Store credentials for an instance that has none yet
    async fn add(&self, app: &RegisteredApp) -> StoreResult<()>;
}
