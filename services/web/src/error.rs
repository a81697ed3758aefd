//! Error taxonomy of the authentication gateway

use common::StoreError;
use thiserror::Error;

use crate::mastodon::RemoteError;

/// Errors surfaced by the gateway and the content service
///
/// The gateway never picks HTTP status codes; the routing layer does.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// No session id, an unknown session, or a session whose instance has no app
    #[error("Invalid session")]
    InvalidSession,

    /// Missing or mismatched CSRF token on a mutating call
    #[error("Invalid CSRF token")]
    InvalidCsrfToken,

    /// The caller omitted or malformed a required value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The instance registry has no credentials for the instance
    #[error("App not found for instance: {0}")]
    AppNotFound(String),

    /// Registering this service with the instance failed
    #[error("App registration failed: {0}")]
    Registration(#[source] RemoteError),

    /// Exchanging the authorization code failed
    #[error("Token exchange failed: {0}")]
    TokenExchange(#[source] RemoteError),

    /// A delegated content call against the instance failed
    #[error("Remote instance error: {0}")]
    Remote(#[from] RemoteError),

    /// The session store or instance registry failed
    #[error("Storage error: {0}")]
    Storage(#[source] StoreError),
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SessionNotFound(_) => GatewayError::InvalidSession,
            StoreError::AppNotFound(instance_url) => GatewayError::AppNotFound(instance_url),
            other => GatewayError::Storage(other),
        }
    }
}

/// Type alias for gateway results
pub type GatewayResult<T> = Result<T, GatewayError>;
