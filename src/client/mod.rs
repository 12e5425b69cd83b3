//! Remote comment service
//!
//! This module contains everything the crawler needs from the video service:
//! - The `CommentService` trait, one method per paginated resource
//! - Error classification (`ServiceError`)
//! - Resource shapes returned by the Data API
//! - `YouTubeClient`, the reqwest-backed implementation

mod models;
mod traits;
mod youtube;

#[cfg(test)]
pub(crate) mod fake;

pub use models::{
    AuthorChannelId, CommentResource, CommentSnippet, CommentThread, PlaylistSummary,
    ThreadReplies, ThreadSnippet,
};
pub use traits::{CommentService, Page, PageToken, ServiceError, ServiceResult};
pub use youtube::{build_http_client, YouTubeClient};
