//! Checkpoint traits and error types
//!
//! This module defines the trait interface for checkpoint backends and
//! associated error types.

use crate::checkpoint::{CheckpointProgress, VideoRecord};
use crate::client::PageToken;
use thiserror::Error;

/// Errors that can occur during checkpoint operations
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed checkpoint document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Video not registered: {0}")]
    UnknownVideo(String),

    #[error("Video id is empty")]
    EmptyVideoId,
}

/// Result type for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Durable per-video progress ledger
///
/// Videos keep their registration order. A video marked done stays done.
pub trait CheckpointStore {
    /// Returns every registered video in registration order
    fn videos(&self) -> CheckpointResult<Vec<VideoRecord>>;

    /// Returns videos not yet done, in registration order
    fn pending_videos(&self) -> CheckpointResult<Vec<VideoRecord>> {
        Ok(self.videos()?.into_iter().filter(|v| !v.done).collect())
    }

    /// Registers a video as pending
    ///
    /// The id is trimmed first. Registering a known id is a no-op.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The video was newly added
    /// * `Ok(false)` - The video was already registered
    fn register_video(&mut self, video_id: &str) -> CheckpointResult<bool>;

    /// Records the outcome of a harvest
    ///
    /// `done == true` clears the cursor. A request to mark a done video as
    /// not done is ignored.
    fn record_progress(
        &mut self,
        video_id: &str,
        cursor: Option<PageToken>,
        done: bool,
    ) -> CheckpointResult<()>;

    /// Makes every recorded change durable
    fn persist(&mut self) -> CheckpointResult<()>;

    /// Counts videos by progress
    fn progress(&self) -> CheckpointResult<CheckpointProgress> {
        Ok(CheckpointProgress::from_records(&self.videos()?))
    }
}

impl<T: CheckpointStore + ?Sized> CheckpointStore for Box<T> {
    fn videos(&self) -> CheckpointResult<Vec<VideoRecord>> {
        (**self).videos()
    }

    fn pending_videos(&self) -> CheckpointResult<Vec<VideoRecord>> {
        (**self).pending_videos()
    }

    fn register_video(&mut self, video_id: &str) -> CheckpointResult<bool> {
        (**self).register_video(video_id)
    }

    fn record_progress(
        &mut self,
        video_id: &str,
        cursor: Option<PageToken>,
        done: bool,
    ) -> CheckpointResult<()> {
        (**self).record_progress(video_id, cursor, done)
    }

    fn persist(&mut self) -> CheckpointResult<()> {
        (**self).persist()
    }

    fn progress(&self) -> CheckpointResult<CheckpointProgress> {
        (**self).progress()
    }
}
