//! Emitted comment records
//!
//! One record per line in the output stream. Top-level comments carry the
//! declared reply count and the video id; replies carry the id of their
//! top-level comment. Records are written at least once: the `id` field is
//! the key downstream consumers deduplicate on.

use crate::client::{CommentResource, CommentThread};
use serde::{Deserialize, Serialize};

/// Fields shared by both record kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentBody {
    pub id: String,
    pub channel_id: String,
    pub text_display: String,
    pub author_display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_channel_id: Option<String>,
    pub like_count: u64,
    pub published_at: String,
}

impl From<&CommentResource> for CommentBody {
    fn from(resource: &CommentResource) -> Self {
        let snippet = &resource.snippet;
        Self {
            id: resource.id.clone(),
            channel_id: snippet.channel_id.clone(),
            text_display: snippet.text_display.clone(),
            author_display_name: snippet.author_display_name.clone(),
            author_channel_id: snippet.author_channel_id.as_ref().map(|a| a.value.clone()),
            like_count: snippet.like_count,
            published_at: snippet.published_at.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopLevelComment {
    #[serde(flatten)]
    pub body: CommentBody,
    pub total_reply_count: u64,
    pub video_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyComment {
    #[serde(flatten)]
    pub body: CommentBody,
    pub parent_id: String,
}

/// A line of the record stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommentRecord {
    TopLevel(TopLevelComment),
    Reply(ReplyComment),
}

impl CommentRecord {
    /// Builds the record for a thread's top-level comment
    pub fn top_level(thread: &CommentThread, video_id: &str) -> Self {
        Self::TopLevel(TopLevelComment {
            body: CommentBody::from(&thread.snippet.top_level_comment),
            total_reply_count: thread.snippet.total_reply_count,
            video_id: video_id.to_string(),
        })
    }

    /// Builds a reply record; `parent_id` is used when the resource omits it
    pub fn reply(resource: &CommentResource, parent_id: &str) -> Self {
        let parent_id = resource
            .snippet
            .parent_id
            .clone()
            .unwrap_or_else(|| parent_id.to_string());
        Self::Reply(ReplyComment {
            body: CommentBody::from(resource),
            parent_id,
        })
    }

    pub fn body(&self) -> &CommentBody {
        match self {
            Self::TopLevel(comment) => &comment.body,
            Self::Reply(comment) => &comment.body,
        }
    }

    /// Deduplication key
    pub fn id(&self) -> &str {
        &self.body().id
    }

    pub fn is_reply(&self) -> bool {
        matches!(self, Self::Reply(_))
    }
}
