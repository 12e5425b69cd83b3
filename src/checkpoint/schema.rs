//! Database schema for the SQLite checkpoint backend

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Registered videos in registration order
CREATE TABLE IF NOT EXISTS videos (
    position INTEGER PRIMARY KEY AUTOINCREMENT,
    video_id TEXT NOT NULL UNIQUE,
    done INTEGER NOT NULL DEFAULT 0,
    resume_cursor TEXT,
    registered_at TEXT NOT NULL,
    updated_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_videos_done ON videos(done);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
