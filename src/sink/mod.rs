//! Record sink
//!
//! This module handles:
//! - The append-only `CommentSink` contract
//! - The record shapes written for top-level comments and replies
//! - The NDJSON file stream used in production
//! - Statistics over written streams, including duplicate counts

mod ndjson;
mod record;
pub mod stats;
mod traits;

pub use ndjson::NdjsonSink;
pub use record::{CommentBody, CommentRecord, ReplyComment, TopLevelComment};
pub use stats::{load_sink_stats, print_sink_stats, SinkStats};
pub use traits::{CommentSink, SinkError, SinkResult};
