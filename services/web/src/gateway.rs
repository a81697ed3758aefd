//! Session and authentication gateway
//!
//! `AuthGateway` wraps a [`ContentService`] and exposes the same operations.
//! Each operation resolves the request's session into an
//! [`AuthenticatedClient`], checks the CSRF token when the operation mutates
//! state, and only then forwards to the inner service. The gateway also runs
//! the sign-in handshake: application registration with instances it has not
//! seen before and the authorization-code token exchange.

use std::{collections::HashMap, future::Future, sync::Arc};

use common::{AppRepository, RegisteredApp, Session, SessionRepository, Settings, StoreError};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    config::ServiceConfig,
    context::{OperationKind, RequestContext},
    error::{GatewayError, GatewayResult},
    mastodon::{self, AppConfig, Pagination},
    service::{
        AboutPage, AccountListPage, ContentService, EmojiPage, NewPost, NotificationPage,
        SearchPage, SettingsPage, ThreadPage, TimelinePage, UserPage, UserSearchPage,
    },
    validation::{normalize_instance_url, validate_object_id},
};

/// Identity this service presents to instances
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub client_name: String,
    pub client_scope: String,
    pub client_website: String,
    pub callback_url: String,
}

impl From<&ServiceConfig> for GatewayConfig {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            client_name: config.client_name.clone(),
            client_scope: config.client_scope.clone(),
            client_website: config.client_website.clone(),
            callback_url: config.callback_url(),
        }
    }
}

/// A session bound to an API client for its instance
///
/// Built per request and never shared between requests.
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    session: Session,
    app: RegisteredApp,
    api: mastodon::Client,
}

impl AuthenticatedClient {
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn app(&self) -> &RegisteredApp {
        &self.app
    }

    pub fn api(&self) -> &mastodon::Client {
        &self.api
    }
}

/// Where to send the browser after `begin_signin`, and the cookie value to set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigninRedirect {
    pub redirect_url: String,
    pub session_id: String,
}

/// Authentication decorator around a content service
pub struct AuthGateway<S> {
    sessions: Arc<dyn SessionRepository>,
    apps: Arc<dyn AppRepository>,
    http: reqwest::Client,
    config: GatewayConfig,
    registration_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    inner: S,
}

impl<S: ContentService> AuthGateway<S> {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        apps: Arc<dyn AppRepository>,
        http: reqwest::Client,
        config: GatewayConfig,
        inner: S,
    ) -> Self {
        Self {
            sessions,
            apps,
            http,
            config,
            registration_locks: Mutex::new(HashMap::new()),
            inner,
        }
    }

    /// Resolve the request's session into an authenticated client
    ///
    /// The access token may still be empty if the handshake has not finished.
    pub async fn resolve_client(&self, ctx: &RequestContext) -> GatewayResult<AuthenticatedClient> {
        let session_id = ctx
            .session_id
            .as_deref()
            .ok_or(GatewayError::InvalidSession)?;

        let session = match self.sessions.get(session_id).await {
            Ok(session) => session,
            Err(e) if e.is_not_found() => {
                debug!("Unknown session id presented");
                return Err(GatewayError::InvalidSession);
            }
            Err(e) => return Err(GatewayError::Storage(e)),
        };

        let app = match self.apps.get(&session.instance_url).await {
            Ok(app) => app,
            Err(e) if e.is_not_found() => {
                warn!(
                    "Session exists but no app is registered for {}",
                    session.instance_url
                );
                return Err(GatewayError::InvalidSession);
            }
            Err(e) => return Err(GatewayError::Storage(e)),
        };

        let api = mastodon::Client::new(
            self.http.clone(),
            mastodon::Config {
                server: app.instance_url.clone(),
                client_id: app.client_id.clone(),
                client_secret: app.client_secret.clone(),
                access_token: session.access_token.clone(),
            },
        );

        Ok(AuthenticatedClient { session, app, api })
    }

    /// Check the request's CSRF token against the session's secret
    pub fn check_csrf(ctx: &RequestContext, client: &AuthenticatedClient) -> GatewayResult<()> {
        let expected = client.session.csrf_token.as_str();
        match ctx.csrf_token.as_deref() {
            Some(given) if !expected.is_empty() && given == expected => Ok(()),
            _ => {
                warn!("CSRF token mismatch for session on {}", client.session.instance_url);
                Err(GatewayError::InvalidCsrfToken)
            }
        }
    }

    /// Resolve, CSRF-check when mutating, then run `call` with the client
    pub async fn guarded_call<T, F, Fut>(
        &self,
        ctx: &RequestContext,
        kind: OperationKind,
        call: F,
    ) -> GatewayResult<T>
    where
        F: FnOnce(AuthenticatedClient) -> Fut,
        Fut: Future<Output = GatewayResult<T>>,
    {
        let client = self.resolve_client(ctx).await?;
        if kind == OperationKind::Mutate {
            Self::check_csrf(ctx, &client)?;
        }
        call(client).await
    }

    /// Start signing in to an instance
    ///
    /// Persists a new session without an access token, registers this service
    /// with the instance if needed, and returns the instance's authorization
    /// URL. A session created before a failed registration stays in the store.
    pub async fn begin_signin(
        &self,
        ctx: &RequestContext,
        instance: &str,
    ) -> GatewayResult<SigninRedirect> {
        let instance_url = normalize_instance_url(instance).map_err(GatewayError::InvalidArgument)?;
        if ctx.session_id.is_some() {
            debug!("Sign-in replaces the session cookie of the request");
        }
        info!("Starting sign-in for instance: {}", instance_url);

        let session = Session::new(instance_url.clone());
        self.sessions.add(&session).await?;

        let app = self.find_or_register_app(&instance_url).await?;

        let mut url = mastodon::endpoint(&instance_url, "/oauth/authorize")
            .map_err(GatewayError::Registration)?;
        url.query_pairs_mut()
            .append_pair("client_id", &app.client_id)
            .append_pair("redirect_uri", &self.config.callback_url)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.client_scope);

        Ok(SigninRedirect {
            redirect_url: url.to_string(),
            session_id: session.id,
        })
    }

    /// Finish signing in with the authorization code from the OAuth callback
    pub async fn complete_signin(&self, ctx: &RequestContext, code: &str) -> GatewayResult<String> {
        if code.is_empty() {
            return Err(GatewayError::InvalidArgument(
                "authorization code is required".to_string(),
            ));
        }

        let client = self.resolve_client(ctx).await?;
        let AuthenticatedClient { mut session, app, .. } = client;

        let token_url = mastodon::endpoint(&app.instance_url, "/oauth/token")
            .map_err(GatewayError::TokenExchange)?;
        let access_token = mastodon::exchange_token(
            &self.http,
            token_url,
            &app.client_id,
            &app.client_secret,
            code,
            &self.config.callback_url,
        )
        .await
        .map_err(|e| {
            warn!("Token exchange with {} failed: {}", app.instance_url, e);
            GatewayError::TokenExchange(e)
        })?;

        session.access_token = access_token.clone();
        self.sessions.add(&session).await?;

        info!("Sign-in completed for instance: {}", app.instance_url);
        Ok(access_token)
    }

    async fn registration_lock(&self, instance_url: &str) -> Arc<Mutex<()>> {
        self.registration_locks
            .lock()
            .await
            .entry(instance_url.to_string())
            .or_default()
            .clone()
    }

    /// Drop the lock entry of an instance unless another request still holds it
    async fn release_registration_lock(&self, instance_url: &str, lock: &Arc<Mutex<()>>) {
        let mut locks = self.registration_locks.lock().await;
        // Handles are only cloned under the map lock: the entry plus ours means nobody waits
        let idle = locks
            .get(instance_url)
            .is_some_and(|entry| Arc::ptr_eq(entry, lock) && Arc::strong_count(lock) <= 2);
        if idle {
            locks.remove(instance_url);
        }
    }

    /// Look up the app for an instance, registering one if none is stored
    ///
    /// Registration for one instance is serialized within this process. When
    /// another process stored credentials first, those win and the freshly
    /// registered ones are dropped.
    async fn find_or_register_app(&self, instance_url: &str) -> GatewayResult<RegisteredApp> {
        let lock = self.registration_lock(instance_url).await;
        let result = {
            let _guard = lock.lock().await;
            self.lookup_or_register_app(instance_url).await
        };
        self.release_registration_lock(instance_url, &lock).await;
        result
    }

    async fn lookup_or_register_app(&self, instance_url: &str) -> GatewayResult<RegisteredApp> {
        match self.apps.get(instance_url).await {
            Ok(app) => return Ok(app),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(GatewayError::Storage(e)),
        }

        let registered = mastodon::register_app(
            &self.http,
            &AppConfig {
                server: instance_url.to_string(),
                client_name: self.config.client_name.clone(),
                scopes: self.config.client_scope.clone(),
                website: self.config.client_website.clone(),
                redirect_uris: self.config.callback_url.clone(),
            },
        )
        .await
        .map_err(|e| {
            warn!("App registration with {} failed: {}", instance_url, e);
            GatewayError::Registration(e)
        })?;

        let app = RegisteredApp {
            instance_url: instance_url.to_string(),
            client_id: registered.client_id,
            client_secret: registered.client_secret,
        };

        match self.apps.add(&app).await {
            Ok(()) => {
                info!("Registered app with instance: {}", instance_url);
                Ok(app)
            }
            Err(StoreError::Conflict(_)) => {
                warn!(
                    "App for {} was registered concurrently; using the stored one",
                    instance_url
                );
                Ok(self.apps.get(instance_url).await?)
            }
            Err(e) => Err(GatewayError::Storage(e)),
        }
    }

    pub async fn timeline(
        &self,
        ctx: &RequestContext,
        page: Pagination,
    ) -> GatewayResult<TimelinePage> {
        self.guarded_call(ctx, OperationKind::Read, |client| async move {
            self.inner.timeline(&client, page).await
        })
        .await
    }

    pub async fn thread(
        &self,
        ctx: &RequestContext,
        id: &str,
        reply: bool,
    ) -> GatewayResult<ThreadPage> {
        let id = object_id(id)?;
        self.guarded_call(ctx, OperationKind::Read, |client| async move {
            self.inner.thread(&client, id, reply).await
        })
        .await
    }

    pub async fn notifications(
        &self,
        ctx: &RequestContext,
        page: Pagination,
    ) -> GatewayResult<NotificationPage> {
        self.guarded_call(ctx, OperationKind::Read, |client| async move {
            self.inner.notifications(&client, page).await
        })
        .await
    }

    pub async fn user(
        &self,
        ctx: &RequestContext,
        id: &str,
        page: Pagination,
    ) -> GatewayResult<UserPage> {
        let id = object_id(id)?;
        self.guarded_call(ctx, OperationKind::Read, |client| async move {
            self.inner.user(&client, id, page).await
        })
        .await
    }

    pub async fn user_search(
        &self,
        ctx: &RequestContext,
        id: &str,
        q: &str,
        offset: u32,
    ) -> GatewayResult<UserSearchPage> {
        let id = object_id(id)?;
        self.guarded_call(ctx, OperationKind::Read, |client| async move {
            self.inner.user_search(&client, id, q, offset).await
        })
        .await
    }

    pub async fn liked_by(&self, ctx: &RequestContext, id: &str) -> GatewayResult<AccountListPage> {
        let id = object_id(id)?;
        self.guarded_call(ctx, OperationKind::Read, |client| async move {
            self.inner.liked_by(&client, id).await
        })
        .await
    }

    pub async fn retweeted_by(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> GatewayResult<AccountListPage> {
        let id = object_id(id)?;
        self.guarded_call(ctx, OperationKind::Read, |client| async move {
            self.inner.retweeted_by(&client, id).await
        })
        .await
    }

    pub async fn following(
        &self,
        ctx: &RequestContext,
        id: &str,
        page: Pagination,
    ) -> GatewayResult<AccountListPage> {
        let id = object_id(id)?;
        self.guarded_call(ctx, OperationKind::Read, |client| async move {
            self.inner.following(&client, id, page).await
        })
        .await
    }

    pub async fn followers(
        &self,
        ctx: &RequestContext,
        id: &str,
        page: Pagination,
    ) -> GatewayResult<AccountListPage> {
        let id = object_id(id)?;
        self.guarded_call(ctx, OperationKind::Read, |client| async move {
            self.inner.followers(&client, id, page).await
        })
        .await
    }

    pub async fn search(
        &self,
        ctx: &RequestContext,
        q: &str,
        kind: Option<String>,
        offset: u32,
    ) -> GatewayResult<SearchPage> {
        self.guarded_call(ctx, OperationKind::Read, |client| async move {
            self.inner.search(&client, q, kind, offset).await
        })
        .await
    }

    pub async fn about(&self, ctx: &RequestContext) -> GatewayResult<AboutPage> {
        self.guarded_call(ctx, OperationKind::Read, |client| async move {
            self.inner.about(&client).await
        })
        .await
    }

    pub async fn emojis(&self, ctx: &RequestContext) -> GatewayResult<EmojiPage> {
        self.guarded_call(ctx, OperationKind::Read, |client| async move {
            self.inner.emojis(&client).await
        })
        .await
    }

    pub async fn settings(&self, ctx: &RequestContext) -> GatewayResult<SettingsPage> {
        self.guarded_call(ctx, OperationKind::Read, |client| async move {
            self.inner.settings(&client).await
        })
        .await
    }

    pub async fn save_settings(
        &self,
        ctx: &RequestContext,
        settings: Settings,
    ) -> GatewayResult<()> {
        self.guarded_call(ctx, OperationKind::Mutate, |client| async move {
            self.inner.save_settings(&client, settings).await
        })
        .await
    }

    pub async fn like(&self, ctx: &RequestContext, id: &str) -> GatewayResult<i64> {
        let id = object_id(id)?;
        self.guarded_call(ctx, OperationKind::Mutate, |client| async move {
            self.inner.like(&client, id).await
        })
        .await
    }

    pub async fn unlike(&self, ctx: &RequestContext, id: &str) -> GatewayResult<i64> {
        let id = object_id(id)?;
        self.guarded_call(ctx, OperationKind::Mutate, |client| async move {
            self.inner.unlike(&client, id).await
        })
        .await
    }

    pub async fn retweet(&self, ctx: &RequestContext, id: &str) -> GatewayResult<i64> {
        let id = object_id(id)?;
        self.guarded_call(ctx, OperationKind::Mutate, |client| async move {
            self.inner.retweet(&client, id).await
        })
        .await
    }

    pub async fn unretweet(&self, ctx: &RequestContext, id: &str) -> GatewayResult<i64> {
        let id = object_id(id)?;
        self.guarded_call(ctx, OperationKind::Mutate, |client| async move {
            self.inner.unretweet(&client, id).await
        })
        .await
    }

    pub async fn post(&self, ctx: &RequestContext, post: NewPost) -> GatewayResult<String> {
        if let Some(reply_to_id) = &post.reply_to_id {
            object_id(reply_to_id)?;
        }
        self.guarded_call(ctx, OperationKind::Mutate, |client| async move {
            self.inner.post(&client, post).await
        })
        .await
    }

    pub async fn follow(&self, ctx: &RequestContext, id: &str) -> GatewayResult<()> {
        let id = object_id(id)?;
        self.guarded_call(ctx, OperationKind::Mutate, |client| async move {
            self.inner.follow(&client, id).await
        })
        .await
    }

    pub async fn unfollow(&self, ctx: &RequestContext, id: &str) -> GatewayResult<()> {
        let id = object_id(id)?;
        self.guarded_call(ctx, OperationKind::Mutate, |client| async move {
            self.inner.unfollow(&client, id).await
        })
        .await
    }
}

/// Reject ids that could change the API path they are placed into
fn object_id(id: &str) -> GatewayResult<&str> {
    validate_object_id(id).map_err(GatewayError::InvalidArgument)?;
    Ok(id)
}
