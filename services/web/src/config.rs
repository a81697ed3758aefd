//! Service configuration

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Storage backend for sessions and registered apps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
    Redis,
}

/// Web client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Application name announced to instances on registration
    pub client_name: String,
    /// OAuth scopes requested from instances
    pub client_scope: String,
    /// Public base address of this service; the OAuth callback lives under it
    pub client_website: String,
    /// Socket address the HTTP server binds to
    pub listen_address: String,
    pub store_backend: StoreBackend,
    /// Timeout applied to every call against a remote instance
    pub request_timeout_secs: u64,
}

impl ServiceConfig {
    /// Load the configuration from defaults overridden by the environment
    ///
    /// # Environment Variables
    /// - `WEB_CLIENT_NAME` (default: "bloat")
    /// - `WEB_CLIENT_SCOPE` (default: "read write follow")
    /// - `WEB_CLIENT_WEBSITE` (default: "http://localhost:8080")
    /// - `WEB_LISTEN_ADDRESS` (default: "0.0.0.0:8080")
    /// - `WEB_STORE_BACKEND`: memory, postgres or redis (default: memory)
    /// - `WEB_REQUEST_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("client_name", "bloat")?
            .set_default("client_scope", "read write follow")?
            .set_default("client_website", "http://localhost:8080")?
            .set_default("listen_address", "0.0.0.0:8080")?
            .set_default("store_backend", "memory")?
            .set_default("request_timeout_secs", 30)?
            .add_source(Environment::with_prefix("WEB"))
            .build()?
            .try_deserialize()
    }

    /// Redirect URI registered with instances and sent during the handshake
    pub fn callback_url(&self) -> String {
        format!("{}/oauth_callback", self.client_website.trim_end_matches('/'))
    }
}
