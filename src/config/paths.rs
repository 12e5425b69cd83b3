//! Data directory layout
//!
//! ```text
//! <data-dir>/raw/<channel>_videos.json
//! <data-dir>/raw/<channel>_checkpoint.db
//! <data-dir>/raw/<channel>_playlists.json
//! <data-dir>/raw/comments/<channel>_comments_<YYYY_MM_DD>.ndjson
//! ```

use crate::config::types::{CheckpointBackend, Config};
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};

/// File locations for one channel
#[derive(Debug, Clone)]
pub struct DataPaths {
    channel: String,
    date: NaiveDate,
    raw_dir: PathBuf,
    comments_dir: PathBuf,
}

impl DataPaths {
    /// Builds the layout for `channel` under `data_dir`, dated `date`
    pub fn new(data_dir: impl AsRef<Path>, channel: &str, date: NaiveDate) -> Self {
        let raw_dir = data_dir.as_ref().join("raw");
        let comments_dir = raw_dir.join("comments");
        Self {
            channel: channel.to_string(),
            date,
            raw_dir,
            comments_dir,
        }
    }

    /// Builds the layout from configuration, dated today
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.output.data_dir,
            config.channel.label(),
            Local::now().date_naive(),
        )
    }

    /// Creates the raw and comments directories if missing
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.comments_dir)
    }

    /// Checkpoint location for the chosen backend
    pub fn checkpoint_path(&self, backend: CheckpointBackend) -> PathBuf {
        match backend {
            CheckpointBackend::Json => self.raw_dir.join(format!("{}_videos.json", self.channel)),
            CheckpointBackend::Sqlite => {
                self.raw_dir.join(format!("{}_checkpoint.db", self.channel))
            }
        }
    }

    /// Playlist listing written by discovery
    pub fn playlists_path(&self) -> PathBuf {
        self.raw_dir.join(format!("{}_playlists.json", self.channel))
    }

    /// Record stream for the current date
    pub fn comments_path(&self) -> PathBuf {
        self.comments_dir.join(format!(
            "{}_comments_{}.ndjson",
            self.channel,
            self.date.format("%Y_%m_%d")
        ))
    }

    /// All record streams for this channel, sorted by date
    pub fn list_comment_files(&self) -> std::io::Result<Vec<PathBuf>> {
        let prefix = format!("{}_comments_", self.channel);
        let mut files = Vec::new();

        if !self.comments_dir.exists() {
            return Ok(files);
        }

        for entry in std::fs::read_dir(&self.comments_dir)? {
            let path = entry?.path();
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(&prefix) && n.ends_with(".ndjson"))
                .unwrap_or(false);
            if matches {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }
}
