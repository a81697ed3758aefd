//! Client for the Mastodon-compatible REST API of a remote instance
//!
//! Covers application registration, the authorization-code token exchange
//! and the authenticated calls the content service needs.

use regex::Regex;
use reqwest::{
    Response, Url,
    header::LINK,
    multipart::{Form, Part},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, info};

/// Errors returned by the remote instance or the transport
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Transport-level failure (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The instance answered with a non-success status
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// An endpoint URL could not be built from the instance URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Parameters for registering this service as an OAuth application
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: String,
    pub client_name: String,
    pub scopes: String,
    pub website: String,
    pub redirect_uris: String,
}

/// Credentials returned by `POST /api/v1/apps`
#[derive(Debug, Clone, Deserialize)]
pub struct Application {
    pub client_id: String,
    pub client_secret: String,
}

/// Build an absolute endpoint URL on an instance
pub fn endpoint(server: &str, path: &str) -> RemoteResult<Url> {
    Url::parse(server)
        .and_then(|base| base.join(path))
        .map_err(|e| RemoteError::InvalidUrl(format!("{}{}: {}", server, path, e)))
}

/// Register an OAuth application with an instance
pub async fn register_app(http: &reqwest::Client, config: &AppConfig) -> RemoteResult<Application> {
    info!("Registering application with instance: {}", config.server);

    let url = endpoint(&config.server, "/api/v1/apps")?;
    let response = http
        .post(url)
        .form(&[
            ("client_name", config.client_name.as_str()),
            ("redirect_uris", config.redirect_uris.as_str()),
            ("scopes", config.scopes.as_str()),
            ("website", config.website.as_str()),
        ])
        .send()
        .await?;

    let app: Application = decode(response).await?;
    if app.client_id.is_empty() || app.client_secret.is_empty() {
        return Err(RemoteError::MalformedResponse(
            "registration response is missing client credentials".to_string(),
        ));
    }

    Ok(app)
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchange an authorization code for an access token
pub async fn exchange_token(
    http: &reqwest::Client,
    token_url: Url,
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> RemoteResult<String> {
    info!("Exchanging authorization code at {}", token_url);

    let response = http
        .post(token_url)
        .json(&TokenRequest {
            client_id,
            client_secret,
            grant_type: "authorization_code",
            code,
            redirect_uri,
        })
        .send()
        .await?;

    let token: TokenResponse = decode(response).await?;
    if token.access_token.is_empty() {
        return Err(RemoteError::MalformedResponse(
            "token response has an empty access_token".to_string(),
        ));
    }

    Ok(token.access_token)
}

async fn check_status(response: Response) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> RemoteResult<T> {
    let body = check_status(response).await?.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| RemoteError::MalformedResponse(e.to_string()))
}

/// Connection parameters of a client bound to one user on one instance
#[derive(Debug, Clone)]
pub struct Config {
    pub server: String,
    pub client_id: String,
    pub client_secret: String,
    pub access_token: String,
}

/// Account entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub acct: String,
    pub display_name: String,
    pub note: String,
    pub avatar: String,
    pub url: String,
    pub locked: bool,
    pub followers_count: i64,
    pub following_count: i64,
    pub statuses_count: i64,
}

/// Mention entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mention {
    pub id: String,
    pub username: String,
    pub acct: String,
    pub url: String,
}

/// Media attached to a status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attachment {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub preview_url: String,
    pub description: Option<String>,
}

/// Status entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Status {
    pub id: String,
    pub url: Option<String>,
    pub account: Account,
    pub content: String,
    pub created_at: String,
    pub in_reply_to_id: Option<String>,
    pub reblog: Option<Box<Status>>,
    pub visibility: String,
    pub sensitive: bool,
    pub spoiler_text: String,
    pub mentions: Vec<Mention>,
    pub media_attachments: Vec<Attachment>,
    pub favourites_count: i64,
    pub reblogs_count: i64,
    pub replies_count: i64,
    pub favourited: Option<bool>,
    pub reblogged: Option<bool>,
}

/// Thread context of a status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Context {
    pub ancestors: Vec<Status>,
    pub descendants: Vec<Status>,
}

/// Relationship between the signed-in account and another account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Relationship {
    pub id: String,
    pub following: bool,
    pub followed_by: bool,
    pub requested: bool,
}

/// Notification entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: String,
    pub account: Account,
    pub status: Option<Status>,
}

/// Hashtag entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    pub name: String,
    pub url: String,
}

/// Results of `GET /api/v2/search`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResults {
    pub accounts: Vec<Account>,
    pub statuses: Vec<Status>,
    pub hashtags: Vec<Tag>,
}

/// Public information about an instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Instance {
    pub uri: String,
    pub title: String,
    pub description: String,
    pub email: String,
    pub version: String,
}

/// Custom emoji entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Emoji {
    pub shortcode: String,
    pub url: String,
    pub static_url: String,
    pub visible_in_picker: bool,
}

/// A file to upload before it is attached to a new status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A status to publish
#[derive(Debug, Clone, Default, Serialize)]
pub struct Toot {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub sensitive: bool,
}

/// Parameters of a search request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub q: String,
    /// `accounts`, `statuses` or `hashtags`; all kinds when `None`
    pub kind: Option<String>,
    /// Restrict status results to one account
    pub account_id: Option<String>,
    pub offset: u32,
    pub limit: u32,
}

impl SearchQuery {
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("q", self.q.clone()),
            ("resolve", "true".to_string()),
            ("offset", self.offset.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(kind) = &self.kind {
            query.push(("type", kind.clone()));
        }
        if let Some(account_id) = &self.account_id {
            query.push(("account_id", account_id.clone()));
        }
        query
    }
}

/// Page cursor, filled in from the `Link` header of the previous page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub max_id: Option<String>,
    pub since_id: Option<String>,
    pub min_id: Option<String>,
    pub limit: Option<u32>,
}

impl Pagination {
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(max_id) = &self.max_id {
            query.push(("max_id", max_id.clone()));
        }
        if let Some(since_id) = &self.since_id {
            query.push(("since_id", since_id.clone()));
        }
        if let Some(min_id) = &self.min_id {
            query.push(("min_id", min_id.clone()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        query
    }
}

/// Cursors for the pages around the one just fetched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    /// Older entries (`rel="next"`)
    pub next: Pagination,
    /// Newer entries (`rel="prev"`)
    pub prev: Pagination,
}

/// Parse an RFC 8288 `Link` header as sent by Mastodon list endpoints
pub fn parse_link_header(header: &str) -> PageLinks {
    static LINK_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = LINK_REGEX.get_or_init(|| {
        Regex::new(r#"<([^>]+)>\s*;\s*rel="([a-z]+)""#).expect("Failed to compile link regex")
    });

    let mut links = PageLinks::default();
    for caps in regex.captures_iter(header) {
        let Ok(url) = Url::parse(&caps[1]) else {
            continue;
        };
        let mut page = Pagination::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "max_id" => page.max_id = Some(value.into_owned()),
                "since_id" => page.since_id = Some(value.into_owned()),
                "min_id" => page.min_id = Some(value.into_owned()),
                _ => {}
            }
        }
        match &caps[2] {
            "next" => links.next = page,
            "prev" => links.prev = page,
            _ => {}
        }
    }
    links
}

/// API client bound to one session's instance, app and access token
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    config: Config,
}

impl Client {
    pub fn new(http: reqwest::Client, config: Config) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build an API URL; each segment is percent-encoded on its own
    fn url(&self, segments: &[&str]) -> RemoteResult<Url> {
        let mut url = endpoint(&self.config.server, "/")?;
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidUrl(self.config.server.clone()))?
            .clear()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&'static str, String)],
    ) -> RemoteResult<T> {
        let url = self.url(segments)?;
        debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;
        decode(response).await
    }

    /// GET a list endpoint and the cursors of its neighbouring pages
    async fn get_page<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        page: &Pagination,
    ) -> RemoteResult<(Vec<T>, PageLinks)> {
        let url = self.url(segments)?;
        debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .query(&page.query())
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;

        let links = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .map(parse_link_header)
            .unwrap_or_default();

        let items = decode(response).await?;
        Ok((items, links))
    }

    async fn post<T: DeserializeOwned>(&self, segments: &[&str]) -> RemoteResult<T> {
        let url = self.url(segments)?;
        debug!("POST {}", url);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;
        decode(response).await
    }

    /// Fetch the home timeline and the cursors of its neighbouring pages
    pub async fn get_timeline_home(
        &self,
        page: &Pagination,
    ) -> RemoteResult<(Vec<Status>, PageLinks)> {
        self.get_page(&["api", "v1", "timelines", "home"], page)
            .await
    }

    pub async fn get_notifications(
        &self,
        page: &Pagination,
    ) -> RemoteResult<(Vec<Notification>, PageLinks)> {
        self.get_page(&["api", "v1", "notifications"], page).await
    }

    pub async fn get_status(&self, id: &str) -> RemoteResult<Status> {
        self.get(&["api", "v1", "statuses", id], &[]).await
    }

    pub async fn get_status_context(&self, id: &str) -> RemoteResult<Context> {
        self.get(&["api", "v1", "statuses", id, "context"], &[])
            .await
    }

    pub async fn get_favourited_by(
        &self,
        id: &str,
        page: &Pagination,
    ) -> RemoteResult<(Vec<Account>, PageLinks)> {
        self.get_page(&["api", "v1", "statuses", id, "favourited_by"], page)
            .await
    }

    pub async fn get_reblogged_by(
        &self,
        id: &str,
        page: &Pagination,
    ) -> RemoteResult<(Vec<Account>, PageLinks)> {
        self.get_page(&["api", "v1", "statuses", id, "reblogged_by"], page)
            .await
    }

    pub async fn favourite(&self, id: &str) -> RemoteResult<Status> {
        self.post(&["api", "v1", "statuses", id, "favourite"])
            .await
    }

    pub async fn unfavourite(&self, id: &str) -> RemoteResult<Status> {
        self.post(&["api", "v1", "statuses", id, "unfavourite"])
            .await
    }

    pub async fn reblog(&self, id: &str) -> RemoteResult<Status> {
        self.post(&["api", "v1", "statuses", id, "reblog"]).await
    }

    pub async fn unreblog(&self, id: &str) -> RemoteResult<Status> {
        self.post(&["api", "v1", "statuses", id, "unreblog"])
            .await
    }

    pub async fn post_status(&self, toot: &Toot) -> RemoteResult<Status> {
        let url = self.url(&["api", "v1", "statuses"])?;
        debug!("POST {}", url);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.access_token)
            .json(toot)
            .send()
            .await?;
        decode(response).await
    }

    /// Upload a file as multipart `file`; the returned id goes into `Toot::media_ids`
    pub async fn upload_media(&self, upload: &MediaUpload) -> RemoteResult<Attachment> {
        let url = self.url(&["api", "v1", "media"])?;
        debug!("POST {} ({} bytes)", url, upload.data.len());

        let part = Part::bytes(upload.data.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.access_token)
            .multipart(Form::new().part("file", part))
            .send()
            .await?;
        decode(response).await
    }

    pub async fn get_account(&self, id: &str) -> RemoteResult<Account> {
        self.get(&["api", "v1", "accounts", id], &[]).await
    }

    pub async fn get_account_statuses(
        &self,
        id: &str,
        page: &Pagination,
    ) -> RemoteResult<(Vec<Status>, PageLinks)> {
        self.get_page(&["api", "v1", "accounts", id, "statuses"], page)
            .await
    }

    pub async fn get_account_following(
        &self,
        id: &str,
        page: &Pagination,
    ) -> RemoteResult<(Vec<Account>, PageLinks)> {
        self.get_page(&["api", "v1", "accounts", id, "following"], page)
            .await
    }

    pub async fn get_account_followers(
        &self,
        id: &str,
        page: &Pagination,
    ) -> RemoteResult<(Vec<Account>, PageLinks)> {
        self.get_page(&["api", "v1", "accounts", id, "followers"], page)
            .await
    }

    /// Relationship of the signed-in account with `id`, if the instance knows one
    pub async fn get_relationship(&self, id: &str) -> RemoteResult<Option<Relationship>> {
        let relationships: Vec<Relationship> = self
            .get(
                &["api", "v1", "accounts", "relationships"],
                &[("id[]", id.to_string())],
            )
            .await?;
        Ok(relationships.into_iter().next())
    }

    pub async fn account_follow(&self, id: &str) -> RemoteResult<Relationship> {
        self.post(&["api", "v1", "accounts", id, "follow"]).await
    }

    pub async fn account_unfollow(&self, id: &str) -> RemoteResult<Relationship> {
        self.post(&["api", "v1", "accounts", id, "unfollow"])
            .await
    }

    pub async fn search(&self, query: &SearchQuery) -> RemoteResult<SearchResults> {
        self.get(&["api", "v2", "search"], &query.query()).await
    }

    pub async fn get_instance(&self) -> RemoteResult<Instance> {
        self.get(&["api", "v1", "instance"], &[]).await
    }

    pub async fn get_custom_emojis(&self) -> RemoteResult<Vec<Emoji>> {
        self.get(&["api", "v1", "custom_emojis"], &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_link_header() {
        let header = r#"<https://example.com/api/v1/timelines/home?max_id=100>; rel="next", <https://example.com/api/v1/timelines/home?min_id=200>; rel="prev""#;
        let links = parse_link_header(header);
        assert_eq!(links.next.max_id.as_deref(), Some("100"));
        assert_eq!(links.next.min_id, None);
        assert_eq!(links.prev.min_id.as_deref(), Some("200"));
    }

    #[test]
    fn test_parse_link_header_ignores_garbage() {
        assert_eq!(parse_link_header("not a link header"), PageLinks::default());
    }

    #[test]
    fn test_endpoint_rejects_relative_server() {
        let err = endpoint("example.com", "/oauth/token").unwrap_err();
        assert!(matches!(err, RemoteError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_register_app_sends_form_and_reads_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/apps"))
            .and(body_string_contains("client_name=bloat"))
            .and(body_string_contains("scopes=read+write+follow"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "1",
                "client_id": "cid",
                "client_secret": "csecret"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let app = register_app(
            &reqwest::Client::new(),
            &AppConfig {
                server: server.uri(),
                client_name: "bloat".to_string(),
                scopes: "read write follow".to_string(),
                website: "http://localhost:8080".to_string(),
                redirect_uris: "http://localhost:8080/oauth_callback".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(app.client_id, "cid");
        assert_eq!(app.client_secret, "csecret");
    }

    #[tokio::test]
    async fn test_exchange_token_surfaces_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad code"))
            .mount(&server)
            .await;

        let err = exchange_token(
            &reqwest::Client::new(),
            endpoint(&server.uri(), "/oauth/token").unwrap(),
            "cid",
            "csecret",
            "code",
            "http://localhost:8080/oauth_callback",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RemoteError::Status { status: 400, ref body } if body == "bad code"));
    }

    #[tokio::test]
    async fn test_exchange_token_posts_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_json(json!({
                "client_id": "cid",
                "client_secret": "csecret",
                "grant_type": "authorization_code",
                "code": "the-code",
                "redirect_uri": "http://localhost:8080/oauth_callback"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok",
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = exchange_token(
            &reqwest::Client::new(),
            endpoint(&server.uri(), "/oauth/token").unwrap(),
            "cid",
            "csecret",
            "the-code",
            "http://localhost:8080/oauth_callback",
        )
        .await
        .unwrap();

        assert_eq!(token, "tok");
    }

    #[tokio::test]
    async fn test_timeline_reads_link_header() {
        let server = MockServer::start().await;
        let next = format!("<{}/api/v1/timelines/home?max_id=5>; rel=\"next\"", server.uri());
        Mock::given(method("GET"))
            .and(path("/api/v1/timelines/home"))
            .and(query_param("limit", "20"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("link", next.as_str())
                    .set_body_json(json!([{ "id": "9", "content": "hello" }])),
            )
            .mount(&server)
            .await;

        let client = Client::new(
            reqwest::Client::new(),
            Config {
                server: server.uri(),
                client_id: "cid".to_string(),
                client_secret: "csecret".to_string(),
                access_token: "tok".to_string(),
            },
        );
        let (statuses, links) = client
            .get_timeline_home(&Pagination {
                limit: Some(20),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].content, "hello");
        assert_eq!(links.next.max_id.as_deref(), Some("5"));
    }

    fn bound_client(server: &MockServer) -> Client {
        Client::new(
            reqwest::Client::new(),
            Config {
                server: server.uri(),
                client_id: "cid".to_string(),
                client_secret: "csecret".to_string(),
                access_token: "tok".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_ids_are_encoded_as_one_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/statuses/a%2Fb%3Fc/favourite"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "a/b?c" })))
            .expect(1)
            .mount(&server)
            .await;

        let status = bound_client(&server).favourite("a/b?c").await.unwrap();
        assert_eq!(status.id, "a/b?c");
    }

    #[tokio::test]
    async fn test_search_sends_type_and_offset() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/search"))
            .and(query_param("q", "rust"))
            .and(query_param("type", "accounts"))
            .and(query_param("offset", "20"))
            .and(query_param("resolve", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accounts": [{ "id": "1", "acct": "ferris" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let results = bound_client(&server)
            .search(&SearchQuery {
                q: "rust".to_string(),
                kind: Some("accounts".to_string()),
                account_id: None,
                offset: 20,
                limit: 20,
            })
            .await
            .unwrap();

        assert_eq!(results.accounts[0].acct, "ferris");
        assert!(results.statuses.is_empty());
    }
}
