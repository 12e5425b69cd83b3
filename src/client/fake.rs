//! Scripted in-memory service for tests
//!
//! Pages are addressed by 1-based number. The first page is requested with
//! no cursor and page `k` (k >= 2) with the token `p{k}`.

use crate::client::models::{
    AuthorChannelId, CommentResource, CommentSnippet, CommentThread, PlaylistSummary,
    ThreadReplies, ThreadSnippet,
};
use crate::client::traits::{CommentService, Page, PageToken, ServiceError, ServiceResult};
use std::collections::HashMap;
use std::sync::Mutex;

pub(crate) const FAKE_CHANNEL_ID: &str = "UCfakechannel";
pub(crate) const FAKE_UPLOADS_ID: &str = "UUfakechannel";

#[derive(Default)]
struct FakeState {
    threads: HashMap<String, Vec<Vec<CommentThread>>>,
    replies: HashMap<String, Vec<Vec<CommentResource>>>,
    uploads: Vec<Vec<String>>,
    playlists: Vec<Vec<PlaylistSummary>>,
    failures: HashMap<(String, usize), ServiceError>,
    quota_after: Option<usize>,
    served: usize,
    calls: Vec<String>,
}

#[derive(Default)]
pub(crate) struct FakeService {
    state: Mutex<FakeState>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threads(self, video_id: &str, pages: Vec<Vec<CommentThread>>) -> Self {
        self.update(|s| {
            s.threads.insert(video_id.to_string(), pages);
        })
    }

    pub fn with_replies(self, parent_id: &str, pages: Vec<Vec<CommentResource>>) -> Self {
        self.update(|s| {
            s.replies.insert(parent_id.to_string(), pages);
        })
    }

    pub fn with_uploads(self, pages: Vec<Vec<String>>) -> Self {
        self.update(|s| s.uploads = pages)
    }

    pub fn with_playlists(self, pages: Vec<Vec<PlaylistSummary>>) -> Self {
        self.update(|s| s.playlists = pages)
    }

    /// Fails page `page` of the resource keyed by `key` (video, parent or playlist id)
    pub fn fail_page(self, key: &str, page: usize, error: ServiceError) -> Self {
        self.update(|s| {
            s.failures.insert((key.to_string(), page), error);
        })
    }

    /// Answers every call after the first `served` successful ones with a quota error
    pub fn quota_after(self, served: usize) -> Self {
        self.update(|s| s.quota_after = Some(served))
    }

    /// Every attempted call as `kind:key:page`
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    fn update(self, f: impl FnOnce(&mut FakeState)) -> Self {
        f(&mut self.lock());
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn serve<T: Clone>(
        &self,
        kind: &str,
        key: &str,
        cursor: Option<&PageToken>,
        pages: impl FnOnce(&FakeState) -> Option<&Vec<Vec<T>>>,
    ) -> ServiceResult<Page<T>> {
        let mut state = self.lock();
        let page = page_number(cursor)?;
        state.calls.push(format!("{}:{}:{}", kind, key, page));

        if let Some(limit) = state.quota_after {
            if state.served >= limit {
                return Err(ServiceError::QuotaExceeded("daily limit".to_string()));
            }
        }
        if let Some(error) = state.failures.get(&(key.to_string(), page)) {
            return Err(error.clone());
        }
        state.served += 1;

        let (items, total) = match pages(&*state) {
            Some(pages) => (pages.get(page - 1).cloned().unwrap_or_default(), pages.len()),
            None => (Vec::new(), 0),
        };
        let next = (page < total).then(|| PageToken::new(format!("p{}", page + 1)));
        Ok(Page::new(items, next))
    }

    fn single(&self, kind: &str, key: &str, value: &str) -> ServiceResult<String> {
        self.serve::<String>(kind, key, None, |_| None)?;
        Ok(value.to_string())
    }
}

fn page_number(cursor: Option<&PageToken>) -> ServiceResult<usize> {
    match cursor {
        None => Ok(1),
        Some(token) => token
            .as_str()
            .strip_prefix('p')
            .and_then(|n| n.parse().ok())
            .filter(|n| *n >= 2)
            .ok_or_else(|| ServiceError::Transient(format!("unknown page token {}", token))),
    }
}

impl CommentService for FakeService {
    async fn resolve_channel_id(&self, handle: &str) -> ServiceResult<String> {
        self.single("channels", handle, FAKE_CHANNEL_ID)
    }

    async fn uploads_playlist(&self, channel_id: &str) -> ServiceResult<String> {
        self.single("uploads", channel_id, FAKE_UPLOADS_ID)
    }

    async fn list_playlists(
        &self,
        channel_id: &str,
        cursor: Option<&PageToken>,
    ) -> ServiceResult<Page<PlaylistSummary>> {
        self.serve("playlists", channel_id, cursor, |s| Some(&s.playlists))
    }

    async fn list_playlist_items(
        &self,
        playlist_id: &str,
        cursor: Option<&PageToken>,
    ) -> ServiceResult<Page<String>> {
        self.serve("items", playlist_id, cursor, |s| Some(&s.uploads))
    }

    async fn list_comment_threads(
        &self,
        video_id: &str,
        cursor: Option<&PageToken>,
    ) -> ServiceResult<Page<CommentThread>> {
        self.serve("threads", video_id, cursor, |s| s.threads.get(video_id))
    }

    async fn list_replies(
        &self,
        parent_id: &str,
        cursor: Option<&PageToken>,
    ) -> ServiceResult<Page<CommentResource>> {
        self.serve("replies", parent_id, cursor, |s| s.replies.get(parent_id))
    }
}

pub(crate) fn comment(id: &str, parent_id: Option<&str>) -> CommentResource {
    CommentResource {
        id: id.to_string(),
        snippet: CommentSnippet {
            channel_id: FAKE_CHANNEL_ID.to_string(),
            text_display: format!("text of {}", id),
            author_display_name: format!("@author-{}", id),
            author_channel_id: Some(AuthorChannelId {
                value: format!("UCauthor-{}", id),
            }),
            like_count: 0,
            published_at: "2024-01-01T00:00:00Z".to_string(),
            parent_id: parent_id.map(str::to_string),
        },
    }
}

/// A thread declaring `total_reply_count` replies with `embedded` of them inlined
pub(crate) fn thread(id: &str, total_reply_count: u64, embedded: usize) -> CommentThread {
    let replies = (embedded > 0).then(|| ThreadReplies {
        comments: (0..embedded)
            .map(|i| comment(&format!("{}.e{}", id, i), Some(id)))
            .collect(),
    });
    CommentThread {
        snippet: ThreadSnippet {
            total_reply_count,
            top_level_comment: comment(id, None),
        },
        replies,
    }
}

/// Reply resources `{parent}.r{i}` for each `i` in `range`
pub(crate) fn replies(parent_id: &str, range: std::ops::Range<usize>) -> Vec<CommentResource> {
    range
        .map(|i| comment(&format!("{}.r{}", parent_id, i), Some(parent_id)))
        .collect()
}

/// Threads without replies, ids `{prefix}{i}`
pub(crate) fn plain_threads(prefix: &str, range: std::ops::Range<usize>) -> Vec<CommentThread> {
    range.map(|i| thread(&format!("{}{}", prefix, i), 0, 0)).collect()
}
