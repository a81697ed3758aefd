//! Server-side web client for Mastodon-compatible instances
//!
//! The browser talks to this service; this service talks to the user's
//! instance. [`gateway::AuthGateway`] turns the session cookie into an
//! authenticated API client, runs the OAuth sign-in handshake and enforces
//! CSRF checks before any content operation runs.

pub mod config;
pub mod context;
pub mod error;
pub mod gateway;
pub mod mastodon;
pub mod routes;
pub mod service;
pub mod state;
pub mod validation;

pub use context::{OperationKind, RequestContext};
pub use error::{GatewayError, GatewayResult};
pub use gateway::{AuthGateway, AuthenticatedClient, GatewayConfig, SigninRedirect};
pub use state::AppState;
