//! Newline-delimited JSON record stream

use crate::sink::traits::{CommentSink, SinkResult};
use crate::sink::CommentRecord;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Appends one JSON object per line to a file
///
/// The file is opened in append mode, so records from earlier sessions are
/// never touched.
pub struct NdjsonSink {
    path: PathBuf,
    writer: BufWriter<File>,
    records_written: u64,
}

impl NdjsonSink {
    /// Opens (or creates) the stream at `path`, creating parent directories
    pub fn open(path: &Path) -> SinkResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        tracing::debug!("Appending records to {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            records_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records appended through this handle
    pub fn records_written(&self) -> u64 {
        self.records_written
    }
}

impl CommentSink for NdjsonSink {
    fn append(&mut self, record: &CommentRecord) -> SinkResult<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.records_written += 1;
        Ok(())
    }

    fn flush(&mut self) -> SinkResult<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        Ok(())
    }
}
