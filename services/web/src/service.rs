//! Content operations performed on behalf of an authenticated user
//!
//! Implementations trust the gateway: every method receives a client that
//! has already been resolved and, for mutating calls, CSRF-checked.

use std::sync::Arc;

use async_trait::async_trait;
use common::{SessionRepository, Settings};
use reqwest::Url;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    error::{GatewayError, GatewayResult},
    gateway::AuthenticatedClient,
    mastodon::{
        Account, Context, Emoji, Instance, MediaUpload, Notification, PageLinks, Pagination,
        Relationship, SearchQuery, SearchResults, Status, Toot,
    },
};

const PAGE_SIZE: u32 = 20;
const VISIBILITIES: [&str; 4] = ["public", "unlisted", "private", "direct"];
const SEARCH_KINDS: [&str; 3] = ["accounts", "statuses", "hashtags"];

/// Home timeline page data
#[derive(Debug, Clone, Serialize)]
pub struct TimelinePage {
    pub statuses: Vec<Status>,
    pub next_link: Option<String>,
    pub prev_link: Option<String>,
    pub csrf_token: String,
}

/// Thread page data
#[derive(Debug, Clone, Serialize)]
pub struct ThreadPage {
    pub status: Status,
    pub context: Context,
    pub reply: bool,
    pub reply_content: String,
    pub csrf_token: String,
}

/// Notifications page data
#[derive(Debug, Clone, Serialize)]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub next_link: Option<String>,
    pub prev_link: Option<String>,
    pub csrf_token: String,
}

/// Profile page data: the account, how we relate to it, and its statuses
#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub account: Account,
    pub relationship: Option<Relationship>,
    pub statuses: Vec<Status>,
    pub next_link: Option<String>,
    pub prev_link: Option<String>,
    pub csrf_token: String,
}

/// A list of accounts: likers, retweeters, following or followers
#[derive(Debug, Clone, Serialize)]
pub struct AccountListPage {
    pub accounts: Vec<Account>,
    pub next_link: Option<String>,
    pub prev_link: Option<String>,
    pub csrf_token: String,
}

/// Search page data
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub q: String,
    pub kind: Option<String>,
    pub results: SearchResults,
    pub next_link: Option<String>,
    pub csrf_token: String,
}

/// Statuses of one account matching a query
#[derive(Debug, Clone, Serialize)]
pub struct UserSearchPage {
    pub account: Account,
    pub q: String,
    pub statuses: Vec<Status>,
    pub next_link: Option<String>,
    pub csrf_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AboutPage {
    pub instance: Instance,
    pub csrf_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmojiPage {
    pub emojis: Vec<Emoji>,
    pub csrf_token: String,
}

/// Settings page data
#[derive(Debug, Clone, Serialize)]
pub struct SettingsPage {
    pub settings: Settings,
    pub csrf_token: String,
}

/// A status submitted from the compose form
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub content: String,
    pub reply_to_id: Option<String>,
    pub format: Option<String>,
    pub visibility: Option<String>,
    pub is_nsfw: bool,
    pub attachments: Vec<MediaUpload>,
}

/// Operations that act on behalf of an authenticated user
#[async_trait]
pub trait ContentService: Send + Sync {
    async fn timeline(
        &self,
        client: &AuthenticatedClient,
        page: Pagination,
    ) -> GatewayResult<TimelinePage>;

    async fn thread(
        &self,
        client: &AuthenticatedClient,
        id: &str,
        reply: bool,
    ) -> GatewayResult<ThreadPage>;

    async fn notifications(
        &self,
        client: &AuthenticatedClient,
        page: Pagination,
    ) -> GatewayResult<NotificationPage>;

    async fn user(
        &self,
        client: &AuthenticatedClient,
        id: &str,
        page: Pagination,
    ) -> GatewayResult<UserPage>;

    async fn user_search(
        &self,
        client: &AuthenticatedClient,
        id: &str,
        q: &str,
        offset: u32,
    ) -> GatewayResult<UserSearchPage>;

    async fn liked_by(
        &self,
        client: &AuthenticatedClient,
        id: &str,
    ) -> GatewayResult<AccountListPage>;

    async fn retweeted_by(
        &self,
        client: &AuthenticatedClient,
        id: &str,
    ) -> GatewayResult<AccountListPage>;

    async fn following(
        &self,
        client: &AuthenticatedClient,
        id: &str,
        page: Pagination,
    ) -> GatewayResult<AccountListPage>;

    async fn followers(
        &self,
        client: &AuthenticatedClient,
        id: &str,
        page: Pagination,
    ) -> GatewayResult<AccountListPage>;

    async fn search(
        &self,
        client: &AuthenticatedClient,
        q: &str,
        kind: Option<String>,
        offset: u32,
    ) -> GatewayResult<SearchPage>;

    async fn about(&self, client: &AuthenticatedClient) -> GatewayResult<AboutPage>;

    async fn emojis(&self, client: &AuthenticatedClient) -> GatewayResult<EmojiPage>;

    async fn settings(&self, client: &AuthenticatedClient) -> GatewayResult<SettingsPage>;

    async fn save_settings(
        &self,
        client: &AuthenticatedClient,
        settings: Settings,
    ) -> GatewayResult<()>;

    /// Favourite a status; returns its new favourite count
    async fn like(&self, client: &AuthenticatedClient, id: &str) -> GatewayResult<i64>;

    async fn unlike(&self, client: &AuthenticatedClient, id: &str) -> GatewayResult<i64>;

    /// Reblog a status; returns its new reblog count
    async fn retweet(&self, client: &AuthenticatedClient, id: &str) -> GatewayResult<i64>;

    async fn unretweet(&self, client: &AuthenticatedClient, id: &str) -> GatewayResult<i64>;

    /// Publish a status; returns the id of the new status
    async fn post(&self, client: &AuthenticatedClient, post: NewPost) -> GatewayResult<String>;

    async fn follow(&self, client: &AuthenticatedClient, id: &str) -> GatewayResult<()>;

    async fn unfollow(&self, client: &AuthenticatedClient, id: &str) -> GatewayResult<()>;
}

/// Content service backed by the remote instance API
#[derive(Clone)]
pub struct InstanceService {
    sessions: Arc<dyn SessionRepository>,
}

impl InstanceService {
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self { sessions }
    }
}

fn reply_content(status: &Status) -> String {
    let mut accts: Vec<&str> = vec![status.account.acct.as_str()];
    for mention in &status.mentions {
        if !accts.contains(&mention.acct.as_str()) {
            accts.push(mention.acct.as_str());
        }
    }
    accts.iter().map(|acct| format!("@{} ", acct)).collect()
}

/// Local link with an encoded query string, e.g. `/search?q=a+b`
fn local_link(path: &str, query: &[(&str, &str)]) -> String {
    let mut url = match Url::parse("http://localhost") {
        Ok(url) => url,
        Err(_) => return path.to_string(),
    };
    url.set_path(path);
    url.query_pairs_mut().extend_pairs(query);
    match url.query() {
        Some(query) if !query.is_empty() => format!("{}?{}", url.path(), query),
        _ => url.path().to_string(),
    }
}

fn page_link(path: &str, page: &Pagination) -> Option<String> {
    if let Some(max_id) = &page.max_id {
        Some(local_link(path, &[("max_id", max_id)]))
    } else if let Some(min_id) = &page.min_id {
        Some(local_link(path, &[("min_id", min_id)]))
    } else {
        page.since_id
            .as_ref()
            .map(|since_id| local_link(path, &[("since_id", since_id)]))
    }
}

fn page_links(path: &str, links: &PageLinks) -> (Option<String>, Option<String>) {
    (page_link(path, &links.next), page_link(path, &links.prev))
}

fn sized(page: Pagination) -> Pagination {
    Pagination {
        limit: Some(PAGE_SIZE),
        ..page
    }
}

fn check_visibility(visibility: &str) -> GatewayResult<()> {
    if VISIBILITIES.contains(&visibility) {
        Ok(())
    } else {
        Err(GatewayError::InvalidArgument(format!(
            "unknown visibility: {}",
            visibility
        )))
    }
}

fn check_search_kind(kind: Option<&str>) -> GatewayResult<()> {
    match kind {
        Some(kind) if !SEARCH_KINDS.contains(&kind) => Err(GatewayError::InvalidArgument(
            format!("unknown search type: {}", kind),
        )),
        _ => Ok(()),
    }
}

fn account_list(
    client: &AuthenticatedClient,
    path: &str,
    (accounts, links): (Vec<Account>, PageLinks),
) -> AccountListPage {
    let (next_link, prev_link) = page_links(path, &links);
    AccountListPage {
        accounts,
        next_link,
        prev_link,
        csrf_token: client.session().csrf_token.clone(),
    }
}

#[async_trait]
impl ContentService for InstanceService {
    async fn timeline(
        &self,
        client: &AuthenticatedClient,
        page: Pagination,
    ) -> GatewayResult<TimelinePage> {
        let (statuses, links) = client.api().get_timeline_home(&sized(page)).await?;
        let (next_link, prev_link) = page_links("/timeline/home", &links);

        Ok(TimelinePage {
            statuses,
            next_link,
            prev_link,
            csrf_token: client.session().csrf_token.clone(),
        })
    }

    async fn thread(
        &self,
        client: &AuthenticatedClient,
        id: &str,
        reply: bool,
    ) -> GatewayResult<ThreadPage> {
        let status = client.api().get_status(id).await?;
        let context = client.api().get_status_context(id).await?;
        let reply_content = if reply {
            reply_content(&status)
        } else {
            String::new()
        };

        Ok(ThreadPage {
            status,
            context,
            reply,
            reply_content,
            csrf_token: client.session().csrf_token.clone(),
        })
    }

    async fn notifications(
        &self,
        client: &AuthenticatedClient,
        page: Pagination,
    ) -> GatewayResult<NotificationPage> {
        let (notifications, links) = client.api().get_notifications(&sized(page)).await?;
        let (next_link, prev_link) = page_links("/notifications", &links);

        Ok(NotificationPage {
            notifications,
            next_link,
            prev_link,
            csrf_token: client.session().csrf_token.clone(),
        })
    }

    async fn user(
        &self,
        client: &AuthenticatedClient,
        id: &str,
        page: Pagination,
    ) -> GatewayResult<UserPage> {
        let account = client.api().get_account(id).await?;
        let relationship = client.api().get_relationship(id).await?;
        let (statuses, links) = client
            .api()
            .get_account_statuses(id, &sized(page))
            .await?;
        let (next_link, prev_link) = page_links(&format!("/user/{}", id), &links);

        Ok(UserPage {
            account,
            relationship,
            statuses,
            next_link,
            prev_link,
            csrf_token: client.session().csrf_token.clone(),
        })
    }

    async fn user_search(
        &self,
        client: &AuthenticatedClient,
        id: &str,
        q: &str,
        offset: u32,
    ) -> GatewayResult<UserSearchPage> {
        let account = client.api().get_account(id).await?;

        let q = q.trim();
        let statuses = if q.is_empty() {
            Vec::new()
        } else {
            client
                .api()
                .search(&SearchQuery {
                    q: q.to_string(),
                    kind: Some("statuses".to_string()),
                    account_id: Some(id.to_string()),
                    offset,
                    limit: PAGE_SIZE,
                })
                .await?
                .statuses
        };

        let next_link = (statuses.len() as u32 >= PAGE_SIZE).then(|| {
            local_link(
                &format!("/usersearch/{}", id),
                &[("q", q), ("offset", &(offset + PAGE_SIZE).to_string())],
            )
        });

        Ok(UserSearchPage {
            account,
            q: q.to_string(),
            statuses,
            next_link,
            csrf_token: client.session().csrf_token.clone(),
        })
    }

    async fn liked_by(
        &self,
        client: &AuthenticatedClient,
        id: &str,
    ) -> GatewayResult<AccountListPage> {
        let accounts = client
            .api()
            .get_favourited_by(id, &sized(Pagination::default()))
            .await?;
        Ok(account_list(client, &format!("/likedby/{}", id), accounts))
    }

    async fn retweeted_by(
        &self,
        client: &AuthenticatedClient,
        id: &str,
    ) -> GatewayResult<AccountListPage> {
        let accounts = client
            .api()
            .get_reblogged_by(id, &sized(Pagination::default()))
            .await?;
        Ok(account_list(client, &format!("/retweetedby/{}", id), accounts))
    }

    async fn following(
        &self,
        client: &AuthenticatedClient,
        id: &str,
        page: Pagination,
    ) -> GatewayResult<AccountListPage> {
        let accounts = client.api().get_account_following(id, &sized(page)).await?;
        Ok(account_list(client, &format!("/following/{}", id), accounts))
    }

    async fn followers(
        &self,
        client: &AuthenticatedClient,
        id: &str,
        page: Pagination,
    ) -> GatewayResult<AccountListPage> {
        let accounts = client.api().get_account_followers(id, &sized(page)).await?;
        Ok(account_list(client, &format!("/followers/{}", id), accounts))
    }

    async fn search(
        &self,
        client: &AuthenticatedClient,
        q: &str,
        kind: Option<String>,
        offset: u32,
    ) -> GatewayResult<SearchPage> {
        check_search_kind(kind.as_deref())?;

        let q = q.trim();
        if q.is_empty() {
            debug!("Empty search query; nothing to fetch");
            return Ok(SearchPage {
                q: String::new(),
                kind,
                results: SearchResults::default(),
                next_link: None,
                csrf_token: client.session().csrf_token.clone(),
            });
        }

        let results = client
            .api()
            .search(&SearchQuery {
                q: q.to_string(),
                kind: kind.clone(),
                account_id: None,
                offset,
                limit: PAGE_SIZE,
            })
            .await?;

        let full = [
            results.accounts.len(),
            results.statuses.len(),
            results.hashtags.len(),
        ]
        .iter()
        .any(|len| *len as u32 >= PAGE_SIZE);
        let next_link = full.then(|| {
            let offset = (offset + PAGE_SIZE).to_string();
            let mut query = vec![("q", q), ("offset", offset.as_str())];
            if let Some(kind) = &kind {
                query.push(("type", kind.as_str()));
            }
            local_link("/search", &query)
        });

        Ok(SearchPage {
            q: q.to_string(),
            kind,
            results,
            next_link,
            csrf_token: client.session().csrf_token.clone(),
        })
    }

    async fn about(&self, client: &AuthenticatedClient) -> GatewayResult<AboutPage> {
        Ok(AboutPage {
            instance: client.api().get_instance().await?,
            csrf_token: client.session().csrf_token.clone(),
        })
    }

    async fn emojis(&self, client: &AuthenticatedClient) -> GatewayResult<EmojiPage> {
        Ok(EmojiPage {
            emojis: client.api().get_custom_emojis().await?,
            csrf_token: client.session().csrf_token.clone(),
        })
    }

    async fn settings(&self, client: &AuthenticatedClient) -> GatewayResult<SettingsPage> {
        Ok(SettingsPage {
            settings: client.session().settings.clone(),
            csrf_token: client.session().csrf_token.clone(),
        })
    }

    async fn save_settings(
        &self,
        client: &AuthenticatedClient,
        settings: Settings,
    ) -> GatewayResult<()> {
        check_visibility(&settings.default_visibility)?;

        let mut session = client.session().clone();
        session.settings = settings;
        self.sessions.add(&session).await?;

        info!("Saved settings for session on {}", session.instance_url);
        Ok(())
    }

    async fn like(&self, client: &AuthenticatedClient, id: &str) -> GatewayResult<i64> {
        let status = client.api().favourite(id).await?;
        Ok(status.favourites_count)
    }

    async fn unlike(&self, client: &AuthenticatedClient, id: &str) -> GatewayResult<i64> {
        let status = client.api().unfavourite(id).await?;
        Ok(status.favourites_count)
    }

    async fn retweet(&self, client: &AuthenticatedClient, id: &str) -> GatewayResult<i64> {
        let status = client.api().reblog(id).await?;
        // The response wraps the original status in `reblog`
        Ok(status
            .reblog
            .map(|original| original.reblogs_count)
            .unwrap_or(status.reblogs_count))
    }

    async fn unretweet(&self, client: &AuthenticatedClient, id: &str) -> GatewayResult<i64> {
        let status = client.api().unreblog(id).await?;
        Ok(status.reblogs_count)
    }

    async fn post(&self, client: &AuthenticatedClient, post: NewPost) -> GatewayResult<String> {
        if post.content.trim().is_empty() && post.attachments.is_empty() {
            return Err(GatewayError::InvalidArgument(
                "status content is required".to_string(),
            ));
        }

        let visibility = post
            .visibility
            .unwrap_or_else(|| client.session().settings.default_visibility.clone());
        check_visibility(&visibility)?;

        let mut media_ids = Vec::with_capacity(post.attachments.len());
        for upload in &post.attachments {
            let attachment = client.api().upload_media(upload).await?;
            debug!("Uploaded {} as media {}", upload.file_name, attachment.id);
            media_ids.push(attachment.id);
        }

        let toot = Toot {
            status: post.content,
            in_reply_to_id: post.reply_to_id,
            media_ids,
            visibility: Some(visibility),
            content_type: post.format,
            sensitive: post.is_nsfw,
        };
        let status = client.api().post_status(&toot).await?;
        Ok(status.id)
    }

    async fn follow(&self, client: &AuthenticatedClient, id: &str) -> GatewayResult<()> {
        client.api().account_follow(id).await?;
        Ok(())
    }

    async fn unfollow(&self, client: &AuthenticatedClient, id: &str) -> GatewayResult<()> {
        client.api().account_unfollow(id).await?;
        Ok(())
    }
}
