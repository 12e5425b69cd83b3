//! Data API resource shapes
//!
//! Only the fields the crawler reads are modelled. A missing required field
//! fails deserialization, which surfaces as `ServiceError::Parse`.

use serde::{Deserialize, Serialize};

/// Envelope shared by every `list` response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

/// A top-level comment with its declared reply count and inlined replies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentThread {
    pub snippet: ThreadSnippet,
    pub replies: Option<ThreadReplies>,
}

impl CommentThread {
    /// Id of the top-level comment
    pub fn comment_id(&self) -> &str {
        &self.snippet.top_level_comment.id
    }

    /// Replies the service inlined into the thread
    pub fn embedded_replies(&self) -> &[CommentResource] {
        self.replies
            .as_ref()
            .map(|r| r.comments.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSnippet {
    pub total_reply_count: u64,
    pub top_level_comment: CommentResource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadReplies {
    #[serde(default)]
    pub comments: Vec<CommentResource>,
}

/// A single comment, top-level or reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResource {
    pub id: String,
    pub snippet: CommentSnippet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSnippet {
    pub channel_id: String,
    pub text_display: String,
    pub author_display_name: String,
    pub author_channel_id: Option<AuthorChannelId>,
    pub like_count: u64,
    pub published_at: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorChannelId {
    pub value: String,
}

/// Playlist listing entry, also the shape written to the playlists file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PlaylistResource {
    pub id: String,
    pub snippet: PlaylistSnippet,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PlaylistSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl From<PlaylistResource> for PlaylistSummary {
    fn from(resource: PlaylistResource) -> Self {
        Self {
            id: resource.id,
            title: resource.snippet.title,
            description: resource.snippet.description,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlaylistItemResource {
    pub content_details: PlaylistItemContentDetails,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlaylistItemContentDetails {
    pub video_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChannelResource {
    pub id: String,
    pub content_details: Option<ChannelContentDetails>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChannelContentDetails {
    pub related_playlists: RelatedPlaylists,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RelatedPlaylists {
    pub uploads: String,
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ApiErrorReason>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorReason {
    #[serde(default)]
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_thread_with_embedded_replies() {
        let body = r#"{
            "nextPageToken": "QURTSl9p",
            "items": [{
                "id": "Ugx1",
                "snippet": {
                    "totalReplyCount": 1,
                    "topLevelComment": {
                        "id": "Ugx1",
                        "snippet": {
                            "channelId": "UCchan",
                            "videoId": "vid1",
                            "textDisplay": "first!",
                            "authorDisplayName": "@someone",
                            "authorChannelId": {"value": "UCauthor"},
                            "likeCount": 3,
                            "publishedAt": "2024-01-01T00:00:00Z"
                        }
                    }
                },
                "replies": {"comments": [{
                    "id": "Ugx1.r1",
                    "snippet": {
                        "channelId": "UCchan",
                        "textDisplay": "second",
                        "authorDisplayName": "@other",
                        "likeCount": 0,
                        "publishedAt": "2024-01-02T00:00:00Z",
                        "parentId": "Ugx1"
                    }
                }]}
            }]
        }"#;

        let page: ListResponse<CommentThread> = serde_json::from_str(body).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("QURTSl9p"));
        assert_eq!(page.items.len(), 1);

        let thread = &page.items[0];
        assert_eq!(thread.comment_id(), "Ugx1");
        assert_eq!(thread.snippet.total_reply_count, 1);
        assert_eq!(thread.embedded_replies().len(), 1);
        assert_eq!(
            thread.embedded_replies()[0].snippet.parent_id.as_deref(),
            Some("Ugx1")
        );
        assert!(thread.embedded_replies()[0].snippet.author_channel_id.is_none());
    }

    #[test]
    fn test_missing_required_field_fails() {
        let body = r#"{"items": [{"snippet": {"topLevelComment": {"id": "x", "snippet": {}}}}]}"#;
        let result: Result<ListResponse<CommentThread>, _> = serde_json::from_str(body);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_listing() {
        let page: ListResponse<PlaylistItemResource> = serde_json::from_str("{}").unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_quota_error_body() {
        let body = r#"{"error": {"code": 403, "message": "quota", "errors": [
            {"message": "quota", "domain": "youtube.quota", "reason": "quotaExceeded"}
        ]}}"#;
        let parsed: ApiErrorBody = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.errors[0].reason, "quotaExceeded");
    }
}
