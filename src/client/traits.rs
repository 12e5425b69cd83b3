//! Service trait and error types
//!
//! This module defines the interface the crawler consumes from the remote
//! comment service, along with the error classification every backend maps
//! its failures onto.

use crate::client::models::{CommentResource, CommentThread, PlaylistSummary};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use thiserror::Error;

/// Errors reported by the remote service
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The service refused the request because the quota is spent
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The response was missing or had malformed expected fields
    #[error("Failed to parse {resource} response: {message}")]
    Parse { resource: String, message: String },

    #[error("Transient service error: {0}")]
    Transient(String),
}

impl ServiceError {
    /// Returns true for the distinguished quota condition
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_))
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Opaque position within a paginated resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageToken(String);

impl PageToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

/// One page of a paginated resource
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,

    /// Cursor of the following page; `None` on the last page
    pub next_page_token: Option<PageToken>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_page_token: Option<PageToken>) -> Self {
        Self {
            items,
            next_page_token,
        }
    }
}

/// Remote comment service
///
/// Every `list_*` call fetches exactly one page and costs one quota unit.
/// Implementations must be shareable across tasks.
pub trait CommentService: Send + Sync {
    /// Resolves a public handle (with or without '@') to a channel id
    fn resolve_channel_id(
        &self,
        handle: &str,
    ) -> impl Future<Output = ServiceResult<String>> + Send;

    /// Returns the id of the playlist holding every upload of a channel
    fn uploads_playlist(
        &self,
        channel_id: &str,
    ) -> impl Future<Output = ServiceResult<String>> + Send;

    /// Lists one page of a channel's playlists
    fn list_playlists(
        &self,
        channel_id: &str,
        cursor: Option<&PageToken>,
    ) -> impl Future<Output = ServiceResult<Page<PlaylistSummary>>> + Send;

    /// Lists one page of video ids in a playlist
    fn list_playlist_items(
        &self,
        playlist_id: &str,
        cursor: Option<&PageToken>,
    ) -> impl Future<Output = ServiceResult<Page<String>>> + Send;

    /// Lists one page of comment threads on a video
    fn list_comment_threads(
        &self,
        video_id: &str,
        cursor: Option<&PageToken>,
    ) -> impl Future<Output = ServiceResult<Page<CommentThread>>> + Send;

    /// Lists one page of replies to a top-level comment
    fn list_replies(
        &self,
        parent_id: &str,
        cursor: Option<&PageToken>,
    ) -> impl Future<Output = ServiceResult<Page<CommentResource>>> + Send;
}
