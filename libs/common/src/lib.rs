//! Common library for the web client
//!
//! This crate provides the persisted models and the two key-value
//! collections the authentication gateway relies on: the session store and
//! the instance registry, with in-memory, PostgreSQL and Redis backends.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, PgStore, init_pool};
//! use common::{Session, SessionRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let store = PgStore::new(init_pool(&config).await?);
//!     store.ensure_schema().await?;
//!     store.add(&Session::new("https://example.com")).await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod database;
pub mod error;
pub mod memory;
pub mod models;
pub mod repository;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use models::{RegisteredApp, Session, Settings};
pub use repository::{AppRepository, SessionRepository};
