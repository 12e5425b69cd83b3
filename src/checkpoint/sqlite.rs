//! SQLite checkpoint backend
//!
//! Every mutation is a single statement committed on return, so `persist`
//! only checkpoints the write-ahead log.

use crate::checkpoint::schema::initialize_schema;
use crate::checkpoint::traits::{CheckpointError, CheckpointResult, CheckpointStore};
use crate::checkpoint::{normalize_video_id, VideoRecord};
use crate::client::PageToken;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite checkpoint backend
pub struct SqliteCheckpointStore {
    conn: Connection,
}

impl SqliteCheckpointStore {
    /// Opens or creates the checkpoint database
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteCheckpointStore)` - Successfully opened/created database
    /// * `Err(CheckpointError)` - Failed to open database
    pub fn new(path: &Path) -> CheckpointResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> CheckpointResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn is_done(&self, video_id: &str) -> CheckpointResult<Option<bool>> {
        let done = self
            .conn
            .query_row(
                "SELECT done FROM videos WHERE video_id = ?1",
                params![video_id],
                |row| row.get::<_, bool>(0),
            )
            .optional()?;
        Ok(done)
    }
}

fn video_from_row(row: &Row<'_>) -> rusqlite::Result<VideoRecord> {
    Ok(VideoRecord {
        video_id: row.get(0)?,
        done: row.get(1)?,
        resume_cursor: row.get::<_, Option<String>>(2)?.map(PageToken::new),
    })
}

impl CheckpointStore for SqliteCheckpointStore {
    fn videos(&self) -> CheckpointResult<Vec<VideoRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT video_id, done, resume_cursor FROM videos ORDER BY position")?;
        let videos = stmt
            .query_map([], video_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(videos)
    }

    fn pending_videos(&self) -> CheckpointResult<Vec<VideoRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT video_id, done, resume_cursor FROM videos WHERE done = 0 ORDER BY position",
        )?;
        let videos = stmt
            .query_map([], video_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(videos)
    }

    fn register_video(&mut self, video_id: &str) -> CheckpointResult<bool> {
        let video_id = normalize_video_id(video_id).ok_or(CheckpointError::EmptyVideoId)?;
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO videos (video_id, registered_at) VALUES (?1, ?2)",
            params![video_id, Utc::now().to_rfc3339()],
        )?;
        Ok(inserted == 1)
    }

    fn record_progress(
        &mut self,
        video_id: &str,
        cursor: Option<PageToken>,
        done: bool,
    ) -> CheckpointResult<()> {
        let cursor = if done { None } else { cursor };
        let updated = self.conn.execute(
            "UPDATE videos SET done = ?2, resume_cursor = ?3, updated_at = ?4
             WHERE video_id = ?1 AND done = 0",
            params![
                video_id,
                done,
                cursor.as_ref().map(PageToken::as_str),
                Utc::now().to_rfc3339()
            ],
        )?;

        if updated == 0 {
            match self.is_done(video_id)? {
                None => return Err(CheckpointError::UnknownVideo(video_id.to_string())),
                Some(true) if !done => {
                    tracing::warn!("Ignoring attempt to reopen finished video {}", video_id)
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn persist(&mut self) -> CheckpointResult<()> {
        self.conn
            .query_row("PRAGMA wal_checkpoint(PASSIVE)", [], |_| Ok(()))?;
        Ok(())
    }
}
