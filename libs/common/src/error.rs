//! Custom error types for the common library
//!
//! This module defines the storage error taxonomy shared by every
//! session store and instance registry backend.

use thiserror::Error;

/// Custom error type for storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// No session is stored under the given id
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// No application is registered for the given instance URL
    #[error("App not found for instance: {0}")]
    AppNotFound(String),

    /// An application is already registered for the given instance URL
    #[error("App already registered for instance: {0}")]
    Conflict(String),

    /// Error occurred in the PostgreSQL backend
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Error occurred in the Redis backend
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// A stored record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Storage configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Whether the error is a lookup miss rather than a backend failure
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::SessionNotFound(_) | StoreError::AppNotFound(_)
        )
    }
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;
