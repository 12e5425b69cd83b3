//! Checkpoint module for persisting per-video progress
//!
//! This module handles:
//! - The ordered ledger of registered videos and their resume cursors
//! - A JSON document backend with atomic replace on persist
//! - A SQLite backend where every mutation is durable on return
//! - Progress counts (done, half-way, undone)

mod json;
mod schema;
mod sqlite;
mod traits;

pub use json::JsonCheckpointStore;
pub use sqlite::SqliteCheckpointStore;
pub use traits::{CheckpointError, CheckpointResult, CheckpointStore};

use crate::client::PageToken;
use crate::config::CheckpointBackend;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Opens the checkpoint store for the configured backend
///
/// # Arguments
///
/// * `backend` - Which backend to open
/// * `path` - Location of the checkpoint file
///
/// # Returns
///
/// * `Ok(Box<dyn CheckpointStore>)` - Store loaded (empty if the file is new)
/// * `Err(CheckpointError)` - The existing file could not be read
pub fn open_checkpoint_store(
    backend: CheckpointBackend,
    path: &Path,
) -> CheckpointResult<Box<dyn CheckpointStore>> {
    tracing::debug!("Opening {:?} checkpoint at {}", backend, path.display());
    Ok(match backend {
        CheckpointBackend::Json => Box::new(JsonCheckpointStore::open(path)?),
        CheckpointBackend::Sqlite => Box::new(SqliteCheckpointStore::new(path)?),
    })
}

/// Progress of one video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    #[serde(rename = "videoId")]
    pub video_id: String,

    pub done: bool,

    /// Page to resume from; absent means start from the first page
    #[serde(rename = "nextPageToken", default)]
    pub resume_cursor: Option<PageToken>,
}

impl VideoRecord {
    pub fn new(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            done: false,
            resume_cursor: None,
        }
    }

    /// Applies a harvest result, never rewinding a done video
    ///
    /// Returns false if the update was rejected.
    pub fn apply_progress(&mut self, cursor: Option<PageToken>, done: bool) -> bool {
        if self.done && !done {
            tracing::warn!(
                "Ignoring attempt to reopen finished video {}",
                self.video_id
            );
            return false;
        }

        self.done = done;
        self.resume_cursor = if done { None } else { cursor };
        true
    }

    /// Folds a second ledger entry for the same video into this one
    ///
    /// Done wins over pending. Between two pending entries the first stored
    /// cursor is kept.
    pub(crate) fn merge_duplicate(&mut self, other: VideoRecord) {
        if self.done || other.done {
            self.done = true;
            self.resume_cursor = None;
        } else if self.resume_cursor.is_none() {
            self.resume_cursor = other.resume_cursor;
        }
    }

    /// Started but not finished
    pub fn is_half_way(&self) -> bool {
        !self.done && self.resume_cursor.is_some()
    }
}

/// Video counts by progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckpointProgress {
    pub done: usize,
    pub half_way: usize,
    pub undone: usize,
}

impl CheckpointProgress {
    pub fn from_records(records: &[VideoRecord]) -> Self {
        records.iter().fold(Self::default(), |mut acc, record| {
            if record.done {
                acc.done += 1;
            } else if record.is_half_way() {
                acc.half_way += 1;
            } else {
                acc.undone += 1;
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.done + self.half_way + self.undone
    }
}

/// Normalizes a video id for registration
pub(crate) fn normalize_video_id(video_id: &str) -> Option<&str> {
    let trimmed = video_id.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
