//! Sink trait and error types

use crate::sink::CommentRecord;
use thiserror::Error;

/// Errors that can occur while writing records
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Append-only destination for emitted records
///
/// A record handed to `append` is never rewritten or retracted. `flush`
/// makes every record appended so far durable.
pub trait CommentSink {
    fn append(&mut self, record: &CommentRecord) -> SinkResult<()>;

    fn flush(&mut self) -> SinkResult<()>;
}

impl CommentSink for Vec<CommentRecord> {
    fn append(&mut self, record: &CommentRecord) -> SinkResult<()> {
        self.push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> SinkResult<()> {
        Ok(())
    }
}

impl<T: CommentSink + ?Sized> CommentSink for &mut T {
    fn append(&mut self, record: &CommentRecord) -> SinkResult<()> {
        (**self).append(record)
    }

    fn flush(&mut self) -> SinkResult<()> {
        (**self).flush()
    }
}
