//! HTTP routes of the web client
//!
//! Handlers build a [`RequestContext`] from the session cookie and, for
//! form submissions, the `csrf_token` field, then call the gateway. Pages
//! are rendered as JSON; mutating forms answer with a redirect.

use axum::{
    Form, Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Path, Query, State,
        multipart::MultipartError,
    },
    http::{
        HeaderMap, StatusCode,
        header::{LOCATION, REFERER},
    },
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use common::Settings;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    context::{RequestContext, SESSION_COOKIE},
    error::GatewayError,
    mastodon::{MediaUpload, Pagination},
    service::NewPost,
    state::AppState,
};

const SESSION_COOKIE_DAYS: i64 = 365;
const MAX_POST_BYTES: usize = 4 << 20;

/// Sign-in form
#[derive(Deserialize)]
pub struct SigninForm {
    #[serde(default)]
    pub instance: String,
}

/// Query of the OAuth callback
#[derive(Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub code: String,
}

/// Cursor query of paginated pages
#[derive(Deserialize)]
pub struct PageQuery {
    pub max_id: Option<String>,
    pub since_id: Option<String>,
    pub min_id: Option<String>,
}

impl PageQuery {
    fn into_pagination(self) -> Pagination {
        Pagination {
            max_id: self.max_id.filter(|v| !v.is_empty()),
            since_id: self.since_id.filter(|v| !v.is_empty()),
            min_id: self.min_id.filter(|v| !v.is_empty()),
            limit: None,
        }
    }
}

/// Search query; `offset` stays a string so a bad value is a 400 from us
#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub offset: Option<String>,
}

/// Thread page query
#[derive(Deserialize)]
pub struct ThreadQuery {
    #[serde(default)]
    pub reply: String,
}

/// Form of the per-status action buttons
#[derive(Deserialize)]
pub struct ActionForm {
    pub csrf_token: Option<String>,
    pub retweeted_by_id: Option<String>,
}

/// Compose form, submitted as `multipart/form-data`
#[derive(Default)]
struct PostForm {
    csrf_token: Option<String>,
    content: String,
    reply_to_id: Option<String>,
    format: Option<String>,
    visibility: Option<String>,
    is_nsfw: bool,
    attachments: Vec<MediaUpload>,
}

/// Settings form; checkboxes submit "true"
#[derive(Deserialize)]
pub struct SettingsForm {
    pub csrf_token: Option<String>,
    #[serde(default)]
    pub visibility: String,
    pub copy_scope: Option<String>,
    pub thread_in_new_tab: Option<String>,
    pub mask_nsfw: Option<String>,
}

/// Create the router for the web client
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_page))
        .route("/health", get(health_check))
        .route("/signin", get(signin_page).post(signin))
        .route("/oauth_callback", get(oauth_callback))
        .route("/signout", get(signout))
        .route("/timeline", get(timeline_old_page))
        .route("/timeline/home", get(timeline_page))
        .route("/thread/:id", get(thread_page))
        .route("/notifications", get(notifications_page))
        .route("/user/:id", get(user_page))
        .route("/usersearch/:id", get(user_search_page))
        .route("/likedby/:id", get(liked_by_page))
        .route("/retweetedby/:id", get(retweeted_by_page))
        .route("/following/:id", get(following_page))
        .route("/followers/:id", get(followers_page))
        .route("/search", get(search_page))
        .route("/about", get(about_page))
        .route("/emojis", get(emojis_page))
        .route("/settings", get(settings_page).post(save_settings))
        .route(
            "/post",
            post(post_status).layer(DefaultBodyLimit::max(MAX_POST_BYTES)),
        )
        .route("/like/:id", post(like))
        .route("/unlike/:id", post(unlike))
        .route("/retweet/:id", post(retweet))
        .route("/unretweet/:id", post(unretweet))
        .route("/follow/:id", post(follow))
        .route("/unfollow/:id", post(unfollow))
        .route("/fluoride/like/:id", post(fluoride_like))
        .route("/fluoride/unlike/:id", post(fluoride_unlike))
        .route("/fluoride/retweet/:id", post(fluoride_retweet))
        .route("/fluoride/unretweet/:id", post(fluoride_unretweet))
        .with_state(state)
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

fn referer(headers: &HeaderMap) -> String {
    headers
        .get(REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("/timeline/home")
        .to_string()
}

fn mutating_context(jar: &CookieJar, csrf_token: Option<String>) -> RequestContext {
    RequestContext::from_cookies(jar).with_csrf_token(csrf_token.unwrap_or_default())
}

fn parse_offset(offset: Option<&str>) -> Result<u32, GatewayError> {
    match offset.filter(|v| !v.is_empty()) {
        None => Ok(0),
        Some(offset) => offset
            .parse()
            .map_err(|_| GatewayError::InvalidArgument(format!("invalid offset: {}", offset))),
    }
}

fn status_anchor(headers: &HeaderMap, id: &str, retweeted_by_id: Option<String>) -> Response {
    let anchor = retweeted_by_id
        .filter(|rid| !rid.is_empty())
        .unwrap_or_else(|| id.to_string());
    found(&format!("{}#status-{}", referer(headers), anchor))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "web"
    }))
}

async fn root_page(jar: CookieJar) -> Response {
    match RequestContext::from_cookies(&jar).session_id {
        Some(_) => found("/timeline/home"),
        None => found("/signin"),
    }
}

async fn signin_page() -> impl IntoResponse {
    Json(json!({
        "action": "/signin",
        "fields": ["instance"]
    }))
}

async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SigninForm>,
) -> Result<(CookieJar, Response), GatewayError> {
    let ctx = RequestContext::from_cookies(&jar);
    let redirect = state.gateway.begin_signin(&ctx, &form.instance).await?;

    let cookie = Cookie::build((SESSION_COOKIE, redirect.session_id))
        .path("/")
        .http_only(true)
        .secure(state.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(SESSION_COOKIE_DAYS))
        .build();

    Ok((jar.add(cookie), found(&redirect.redirect_url)))
}

async fn oauth_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, GatewayError> {
    let ctx = RequestContext::from_cookies(&jar);
    state.gateway.complete_signin(&ctx, &query.code).await?;
    Ok(found("/timeline/home"))
}

/// Clears the cookie only; the stored session is left in place
async fn signout(jar: CookieJar) -> (CookieJar, Response) {
    info!("Signing out");
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, found("/"))
}

async fn timeline_old_page() -> Response {
    found("/timeline/home")
}

async fn timeline_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<PageQuery>,
) -> Result<Response, GatewayError> {
    let ctx = RequestContext::from_cookies(&jar);
    let data = state
        .gateway
        .timeline(&ctx, query.into_pagination())
        .await?;
    Ok(Json(data).into_response())
}

async fn thread_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Query(query): Query<ThreadQuery>,
) -> Result<Response, GatewayError> {
    let ctx = RequestContext::from_cookies(&jar);
    let data = state
        .gateway
        .thread(&ctx, &id, !query.reply.is_empty())
        .await?;
    Ok(Json(data).into_response())
}

async fn notifications_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<PageQuery>,
) -> Result<Response, GatewayError> {
    let ctx = RequestContext::from_cookies(&jar);
    let data = state
        .gateway
        .notifications(&ctx, query.into_pagination())
        .await?;
    Ok(Json(data).into_response())
}

async fn user_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, GatewayError> {
    let ctx = RequestContext::from_cookies(&jar);
    let data = state
        .gateway
        .user(&ctx, &id, query.into_pagination())
        .await?;
    Ok(Json(data).into_response())
}

async fn user_search_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Query(query): Query<SearchParams>,
) -> Result<Response, GatewayError> {
    let ctx = RequestContext::from_cookies(&jar);
    let offset = parse_offset(query.offset.as_deref())?;
    let data = state
        .gateway
        .user_search(&ctx, &id, &query.q, offset)
        .await?;
    Ok(Json(data).into_response())
}

async fn liked_by_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<Response, GatewayError> {
    let ctx = RequestContext::from_cookies(&jar);
    let data = state.gateway.liked_by(&ctx, &id).await?;
    Ok(Json(data).into_response())
}

async fn retweeted_by_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<Response, GatewayError> {
    let ctx = RequestContext::from_cookies(&jar);
    let data = state.gateway.retweeted_by(&ctx, &id).await?;
    Ok(Json(data).into_response())
}

async fn following_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, GatewayError> {
    let ctx = RequestContext::from_cookies(&jar);
    let data = state
        .gateway
        .following(&ctx, &id, query.into_pagination())
        .await?;
    Ok(Json(data).into_response())
}

async fn followers_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, GatewayError> {
    let ctx = RequestContext::from_cookies(&jar);
    let data = state
        .gateway
        .followers(&ctx, &id, query.into_pagination())
        .await?;
    Ok(Json(data).into_response())
}

async fn search_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<SearchParams>,
) -> Result<Response, GatewayError> {
    let ctx = RequestContext::from_cookies(&jar);
    let offset = parse_offset(query.offset.as_deref())?;
    let kind = query.kind.filter(|v| !v.is_empty());
    let data = state.gateway.search(&ctx, &query.q, kind, offset).await?;
    Ok(Json(data).into_response())
}

async fn about_page(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, GatewayError> {
    let ctx = RequestContext::from_cookies(&jar);
    let data = state.gateway.about(&ctx).await?;
    Ok(Json(data).into_response())
}

async fn emojis_page(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, GatewayError> {
    let ctx = RequestContext::from_cookies(&jar);
    let data = state.gateway.emojis(&ctx).await?;
    Ok(Json(data).into_response())
}

async fn settings_page(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, GatewayError> {
    let ctx = RequestContext::from_cookies(&jar);
    let data = state.gateway.settings(&ctx).await?;
    Ok(Json(data).into_response())
}

async fn save_settings(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Form(form): Form<SettingsForm>,
) -> Result<Response, GatewayError> {
    let ctx = mutating_context(&jar, form.csrf_token);
    let checked = |value: Option<String>| value.as_deref() == Some("true");
    let settings = Settings {
        default_visibility: form.visibility,
        copy_scope: checked(form.copy_scope),
        thread_in_new_tab: checked(form.thread_in_new_tab),
        mask_nsfw: checked(form.mask_nsfw),
    };
    state.gateway.save_settings(&ctx, settings).await?;
    Ok(found(&referer(&headers)))
}

fn invalid_form(e: MultipartError) -> GatewayError {
    GatewayError::InvalidArgument(format!("invalid form: {}", e))
}

async fn read_post_form(mut multipart: Multipart) -> Result<PostForm, GatewayError> {
    let mut form = PostForm::default();

    while let Some(field) = multipart.next_field().await.map_err(invalid_form)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "attachments" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field.bytes().await.map_err(invalid_form)?;
            // Browsers submit an empty part when no file is picked
            if !data.is_empty() {
                form.attachments.push(MediaUpload {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            continue;
        }

        let value = field.text().await.map_err(invalid_form)?;
        let non_empty = Some(value.clone()).filter(|v| !v.is_empty());
        match name.as_str() {
            "csrf_token" => form.csrf_token = Some(value),
            "content" => form.content = value,
            "reply_to_id" => form.reply_to_id = non_empty,
            "format" => form.format = non_empty,
            "visibility" => form.visibility = non_empty,
            "is_nsfw" => form.is_nsfw = value == "on",
            _ => {}
        }
    }

    Ok(form)
}

async fn post_status(
    State(state): State<AppState>,
    jar: CookieJar,
    multipart: Multipart,
) -> Result<Response, GatewayError> {
    let form = read_post_form(multipart).await?;
    let ctx = mutating_context(&jar, form.csrf_token);
    let reply_to_id = form.reply_to_id;
    let post = NewPost {
        content: form.content,
        reply_to_id: reply_to_id.clone(),
        format: form.format,
        visibility: form.visibility,
        is_nsfw: form.is_nsfw,
        attachments: form.attachments,
    };
    let id = state.gateway.post(&ctx, post).await?;

    let location = match reply_to_id {
        Some(reply_to_id) => format!("/thread/{}#status-{}", reply_to_id, id),
        None => format!("/timeline/home#status-{}", id),
    };
    Ok(found(&location))
}

async fn like(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(form): Form<ActionForm>,
) -> Result<Response, GatewayError> {
    let ctx = mutating_context(&jar, form.csrf_token);
    state.gateway.like(&ctx, &id).await?;
    Ok(status_anchor(&headers, &id, form.retweeted_by_id))
}

async fn unlike(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(form): Form<ActionForm>,
) -> Result<Response, GatewayError> {
    let ctx = mutating_context(&jar, form.csrf_token);
    state.gateway.unlike(&ctx, &id).await?;
    Ok(status_anchor(&headers, &id, form.retweeted_by_id))
}

async fn retweet(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(form): Form<ActionForm>,
) -> Result<Response, GatewayError> {
    let ctx = mutating_context(&jar, form.csrf_token);
    state.gateway.retweet(&ctx, &id).await?;
    Ok(status_anchor(&headers, &id, form.retweeted_by_id))
}

async fn unretweet(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(form): Form<ActionForm>,
) -> Result<Response, GatewayError> {
    let ctx = mutating_context(&jar, form.csrf_token);
    state.gateway.unretweet(&ctx, &id).await?;
    Ok(status_anchor(&headers, &id, form.retweeted_by_id))
}

async fn follow(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(form): Form<ActionForm>,
) -> Result<Response, GatewayError> {
    let ctx = mutating_context(&jar, form.csrf_token);
    state.gateway.follow(&ctx, &id).await?;
    Ok(found(&referer(&headers)))
}

async fn unfollow(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(form): Form<ActionForm>,
) -> Result<Response, GatewayError> {
    let ctx = mutating_context(&jar, form.csrf_token);
    state.gateway.unfollow(&ctx, &id).await?;
    Ok(found(&referer(&headers)))
}

async fn fluoride_like(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Form(form): Form<ActionForm>,
) -> Result<Response, GatewayError> {
    let ctx = mutating_context(&jar, form.csrf_token);
    let count = state.gateway.like(&ctx, &id).await?;
    Ok(Json(json!({ "data": count })).into_response())
}

async fn fluoride_unlike(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Form(form): Form<ActionForm>,
) -> Result<Response, GatewayError> {
    let ctx = mutating_context(&jar, form.csrf_token);
    let count = state.gateway.unlike(&ctx, &id).await?;
    Ok(Json(json!({ "data": count })).into_response())
}

async fn fluoride_retweet(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Form(form): Form<ActionForm>,
) -> Result<Response, GatewayError> {
    let ctx = mutating_context(&jar, form.csrf_token);
    let count = state.gateway.retweet(&ctx, &id).await?;
    Ok(Json(json!({ "data": count })).into_response())
}

async fn fluoride_unretweet(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Form(form): Form<ActionForm>,
) -> Result<Response, GatewayError> {
    let ctx = mutating_context(&jar, form.csrf_token);
    let count = state.gateway.unretweet(&ctx, &id).await?;
    Ok(Json(json!({ "data": count })).into_response())
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::InvalidSession | GatewayError::AppNotFound(_) => {
                StatusCode::UNAUTHORIZED
            }
            GatewayError::InvalidCsrfToken => StatusCode::FORBIDDEN,
            GatewayError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            GatewayError::Registration(_)
            | GatewayError::TokenExchange(_)
            | GatewayError::Remote(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
