//! YouTube Data API v3 client
//!
//! This module implements `CommentService` over HTTPS, including:
//! - Building the HTTP client with the crawler's user agent
//! - Endpoint URL construction with the API key and page parameters
//! - Mapping HTTP failures onto `ServiceError` variants
//! - The fixed inter-request delay

use crate::client::models::{
    ApiErrorBody, ChannelResource, CommentResource, CommentThread, ListResponse,
    PlaylistItemResource, PlaylistResource, PlaylistSummary,
};
use crate::client::traits::{CommentService, Page, PageToken, ServiceError, ServiceResult};
use crate::config::{ApiConfig, Config, CrawlerConfig};
use crate::{ConfigError, HarvestError};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Error reasons the service uses for a spent quota
const QUOTA_REASONS: &[&str] = &["quotaExceeded", "dailyLimitExceeded"];

/// Builds an HTTP client for the Data API
pub fn build_http_client(api: &ApiConfig) -> Result<Client, reqwest::Error> {
    let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(api.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Page sizes requested per resource kind
#[derive(Debug, Clone, Copy)]
struct PageSizes {
    threads: u32,
    replies: u32,
    playlists: u32,
}

/// Data API client
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    http: Client,
    base_url: Url,
    api_key: String,
    request_delay: Duration,
    page_sizes: PageSizes,
}

impl YouTubeClient {
    /// Creates a client with an explicit API key
    pub fn new(
        api: &ApiConfig,
        crawler: &CrawlerConfig,
        api_key: impl Into<String>,
    ) -> Result<Self, HarvestError> {
        let base_url = Url::parse(&api.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl(format!(
                "base-url '{}' cannot carry resource paths",
                api.base_url
            ))
            .into());
        }

        Ok(Self {
            http: build_http_client(api)?,
            base_url,
            api_key: api_key.into(),
            request_delay: Duration::from_millis(api.request_delay_ms),
            page_sizes: PageSizes {
                threads: crawler.thread_page_size,
                replies: crawler.reply_page_size,
                playlists: crawler.playlist_page_size,
            },
        })
    }

    /// Creates a client reading the API key from the configured environment variable
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let api_key = std::env::var(&config.api.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey(config.api.api_key_env.clone()))?;
        Self::new(&config.api, &config.crawler, api_key)
    }

    /// Builds the URL of a resource listing with its query parameters
    fn endpoint(&self, resource: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(resource);
        }
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            query.append_pair("key", &self.api_key);
        }
        url
    }

    /// Issues one GET and decodes the body
    async fn get<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, &str)],
    ) -> ServiceResult<T> {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        let url = self.endpoint(resource, params);
        tracing::debug!("GET {} {:?}", resource, params);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ServiceError::Transient(format!("{}: {}", resource, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::Transient(format!("{}: {}", resource, e)))?;

        if !status.is_success() {
            return Err(classify_failure(resource, status, &body));
        }

        serde_json::from_str(&body).map_err(|e| ServiceError::Parse {
            resource: resource.to_string(),
            message: e.to_string(),
        })
    }

    async fn list<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, &str)],
        cursor: Option<&PageToken>,
    ) -> ServiceResult<Page<T>> {
        let mut params = params.to_vec();
        if let Some(cursor) = cursor {
            params.push(("pageToken", cursor.as_str()));
        }

        let response: ListResponse<T> = self.get(resource, &params).await?;
        Ok(Page::new(
            response.items,
            response.next_page_token.map(PageToken::new),
        ))
    }

    async fn first_channel(
        &self,
        params: &[(&str, &str)],
        what: &str,
    ) -> ServiceResult<ChannelResource> {
        let response: ListResponse<ChannelResource> = self.get("channels", params).await?;
        response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::NotFound(format!("channel {}", what)))
    }
}

impl CommentService for YouTubeClient {
    async fn resolve_channel_id(&self, handle: &str) -> ServiceResult<String> {
        let handle = format!("@{}", handle.trim_start_matches('@'));
        let channel = self
            .first_channel(&[("part", "id"), ("forHandle", handle.as_str())], &handle)
            .await?;
        Ok(channel.id)
    }

    async fn uploads_playlist(&self, channel_id: &str) -> ServiceResult<String> {
        let channel = self
            .first_channel(&[("part", "contentDetails"), ("id", channel_id)], channel_id)
            .await?;
        channel
            .content_details
            .map(|details| details.related_playlists.uploads)
            .ok_or_else(|| ServiceError::Parse {
                resource: "channels".to_string(),
                message: format!("channel {} has no contentDetails", channel_id),
            })
    }

    async fn list_playlists(
        &self,
        channel_id: &str,
        cursor: Option<&PageToken>,
    ) -> ServiceResult<Page<PlaylistSummary>> {
        let max_results = self.page_sizes.playlists.to_string();
        let page: Page<PlaylistResource> = self
            .list(
                "playlists",
                &[
                    ("part", "snippet"),
                    ("channelId", channel_id),
                    ("maxResults", max_results.as_str()),
                ],
                cursor,
            )
            .await?;
        Ok(Page::new(
            page.items.into_iter().map(PlaylistSummary::from).collect(),
            page.next_page_token,
        ))
    }

    async fn list_playlist_items(
        &self,
        playlist_id: &str,
        cursor: Option<&PageToken>,
    ) -> ServiceResult<Page<String>> {
        let max_results = self.page_sizes.playlists.to_string();
        let page: Page<PlaylistItemResource> = self
            .list(
                "playlistItems",
                &[
                    ("part", "contentDetails"),
                    ("playlistId", playlist_id),
                    ("maxResults", max_results.as_str()),
                ],
                cursor,
            )
            .await?;
        Ok(Page::new(
            page.items
                .into_iter()
                .map(|item| item.content_details.video_id)
                .collect(),
            page.next_page_token,
        ))
    }

    async fn list_comment_threads(
        &self,
        video_id: &str,
        cursor: Option<&PageToken>,
    ) -> ServiceResult<Page<CommentThread>> {
        let max_results = self.page_sizes.threads.to_string();
        self.list(
            "commentThreads",
            &[
                ("part", "snippet,replies"),
                ("videoId", video_id),
                ("textFormat", "plainText"),
                ("maxResults", max_results.as_str()),
            ],
            cursor,
        )
        .await
    }

    async fn list_replies(
        &self,
        parent_id: &str,
        cursor: Option<&PageToken>,
    ) -> ServiceResult<Page<CommentResource>> {
        let max_results = self.page_sizes.replies.to_string();
        self.list(
            "comments",
            &[
                ("part", "snippet"),
                ("parentId", parent_id),
                ("textFormat", "plainText"),
                ("maxResults", max_results.as_str()),
            ],
            cursor,
        )
        .await
    }
}

/// Maps a non-2xx response onto a service error
fn classify_failure(resource: &str, status: StatusCode, body: &str) -> ServiceError {
    let detail = serde_json::from_str::<ApiErrorBody>(body).ok().map(|b| b.error);
    let message = detail
        .as_ref()
        .map(|d| d.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.to_string());

    let quota_reason = detail
        .as_ref()
        .map(|d| {
            d.errors
                .iter()
                .any(|e| QUOTA_REASONS.contains(&e.reason.as_str()))
        })
        .unwrap_or_else(|| QUOTA_REASONS.iter().any(|r| body.contains(r)));

    match status {
        StatusCode::FORBIDDEN if quota_reason => ServiceError::QuotaExceeded(message),
        StatusCode::NOT_FOUND => ServiceError::NotFound(format!("{}: {}", resource, message)),
        _ => ServiceError::Transient(format!("{} returned {}: {}", resource, status, message)),
    }
}
