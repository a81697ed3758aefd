//! Persisted records: sessions, registered applications and per-session settings

use chrono::{DateTime, SubsecRound, Utc};
use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const CSRF_TOKEN_LENGTH: usize = 32;

/// Display preferences kept alongside a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub default_visibility: String,
    pub copy_scope: bool,
    pub thread_in_new_tab: bool,
    pub mask_nsfw: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_visibility: "public".to_string(),
            copy_scope: true,
            thread_in_new_tab: false,
            mask_nsfw: true,
        }
    }
}

/// Session entity
///
/// Binds a browser cookie to one remote instance. `access_token` stays empty
/// until the OAuth callback completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub instance_url: String,
    pub access_token: String,
    pub csrf_token: String,
    #[serde(default)]
    pub settings: Settings,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a fresh session for an instance, with a new id and CSRF secret
    pub fn new(instance_url: impl Into<String>) -> Self {
        Self {
            id: new_session_id(),
            instance_url: instance_url.into(),
            access_token: String::new(),
            csrf_token: new_csrf_token(),
            settings: Settings::default(),
            // PostgreSQL keeps microseconds
            created_at: Utc::now().trunc_subsecs(6),
        }
    }

    /// Whether the OAuth handshake has attached an access token
    pub fn is_active(&self) -> bool {
        !self.access_token.is_empty()
    }
}

/// OAuth application credentials issued by one instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredApp {
    pub instance_url: String,
    pub client_id: String,
    pub client_secret: String,
}

fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn new_csrf_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CSRF_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}
