//! JSON document checkpoint backend
//!
//! The whole ledger lives in memory and is written out as one pretty JSON
//! array. Persisting writes a sibling temp file, syncs it and renames it over
//! the target, so a crash mid-write leaves the previous document intact.

use crate::checkpoint::traits::{CheckpointError, CheckpointResult, CheckpointStore};
use crate::checkpoint::{normalize_video_id, VideoRecord};
use crate::client::PageToken;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Checkpoint store backed by a JSON document
pub struct JsonCheckpointStore {
    path: PathBuf,
    videos: Vec<VideoRecord>,
    index: HashMap<String, usize>,
    dirty: bool,
}

impl JsonCheckpointStore {
    /// Loads the ledger at `path`
    ///
    /// A missing or empty file yields an empty ledger. Duplicate ids in the
    /// document are merged into their first position; the entry is done if
    /// any copy is done.
    pub fn open(path: &Path) -> CheckpointResult<Self> {
        let records: Vec<VideoRecord> = match std::fs::read_to_string(path) {
            Ok(contents) if contents.trim().is_empty() => Vec::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let mut store = Self {
            path: path.to_path_buf(),
            videos: Vec::with_capacity(records.len()),
            index: HashMap::with_capacity(records.len()),
            dirty: false,
        };
        for record in records {
            if let Some(&position) = store.index.get(&record.video_id) {
                tracing::warn!("Merging duplicate checkpoint entry {}", record.video_id);
                store.videos[position].merge_duplicate(record);
                store.dirty = true;
                continue;
            }
            store.index.insert(record.video_id.clone(), store.videos.len());
            store.videos.push(record);
        }

        tracing::debug!(
            "Loaded {} checkpoint entries from {}",
            store.videos.len(),
            path.display()
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if there are changes not yet persisted
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn write_document(&self) -> CheckpointResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = temp_path(&self.path);
        let json = serde_json::to_vec_pretty(&self.videos)?;
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

impl CheckpointStore for JsonCheckpointStore {
    fn videos(&self) -> CheckpointResult<Vec<VideoRecord>> {
        Ok(self.videos.clone())
    }

    fn register_video(&mut self, video_id: &str) -> CheckpointResult<bool> {
        let video_id = normalize_video_id(video_id).ok_or(CheckpointError::EmptyVideoId)?;
        if self.index.contains_key(video_id) {
            return Ok(false);
        }

        self.index.insert(video_id.to_string(), self.videos.len());
        self.videos.push(VideoRecord::new(video_id));
        self.dirty = true;
        Ok(true)
    }

    fn record_progress(
        &mut self,
        video_id: &str,
        cursor: Option<PageToken>,
        done: bool,
    ) -> CheckpointResult<()> {
        let position = *self
            .index
            .get(video_id)
            .ok_or_else(|| CheckpointError::UnknownVideo(video_id.to_string()))?;

        if self.videos[position].apply_progress(cursor, done) {
            self.dirty = true;
        }
        Ok(())
    }

    fn persist(&mut self) -> CheckpointResult<()> {
        self.write_document()?;
        self.dirty = false;
        Ok(())
    }
}

impl Drop for JsonCheckpointStore {
    fn drop(&mut self) {
        if !self.dirty {
            return;
        }
        if let Err(e) = self.write_document() {
            tracing::error!(
                "Failed to persist checkpoint {} on shutdown: {}",
                self.path.display(),
                e
            );
        }
    }
}
