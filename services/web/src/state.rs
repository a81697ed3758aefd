//! Application state shared across handlers

use std::sync::Arc;

use crate::{gateway::AuthGateway, service::InstanceService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<AuthGateway<InstanceService>>,
    /// Mark the session cookie `Secure` (the service is served over https)
    pub secure_cookies: bool,
}
