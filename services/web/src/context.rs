//! Request-scoped values the gateway needs from the HTTP boundary

use axum_extra::extract::CookieJar;

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "session_id";

/// Whether an operation changes state on the instance or in the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Read,
    Mutate,
}

/// Per-request context, built once at the routing boundary
///
/// Empty strings are stored as `None` so that "absent" has one representation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub session_id: Option<String>,
    pub csrf_token: Option<String>,
}

fn non_empty(value: impl Into<String>) -> Option<String> {
    Some(value.into()).filter(|v| !v.is_empty())
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context carrying the session cookie of the request, if any
    pub fn from_cookies(jar: &CookieJar) -> Self {
        Self {
            session_id: jar
                .get(SESSION_COOKIE)
                .and_then(|cookie| non_empty(cookie.value())),
            csrf_token: None,
        }
    }

    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = non_empty(session_id);
        self
    }

    #[must_use]
    pub fn with_csrf_token(mut self, csrf_token: impl Into<String>) -> Self {
        self.csrf_token = non_empty(csrf_token);
        self
    }
}
