//! Statistics over the emitted record streams
//!
//! Streams are at-least-once, so a record id can appear more than once
//! across files (and within one, after a resumed page). These counts let
//! an operator see how much duplication downstream has to absorb.

use crate::sink::traits::SinkResult;
use crate::sink::CommentRecord;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Record stream summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkStats {
    /// Files read
    pub files: usize,

    /// Lines that parsed as records
    pub total: u64,

    pub top_level: u64,

    pub replies: u64,

    /// Distinct record ids
    pub unique: u64,

    /// Lines that did not parse, e.g. a record cut short by a crash
    pub malformed: u64,
}

impl SinkStats {
    /// Records that repeat an id already seen
    pub fn duplicates(&self) -> u64 {
        self.total - self.unique
    }
}

/// Loads statistics from one or more NDJSON streams
///
/// # Arguments
///
/// * `paths` - Stream files, read in order
///
/// # Returns
///
/// * `Ok(SinkStats)` - Counts over every readable line
/// * `Err(SinkError)` - A file could not be opened or read
pub fn load_sink_stats(paths: &[PathBuf]) -> SinkResult<SinkStats> {
    let mut stats = SinkStats::default();
    let mut seen = HashSet::new();

    for path in paths {
        read_stream(path, &mut stats, &mut seen)?;
        stats.files += 1;
    }

    stats.unique = seen.len() as u64;
    Ok(stats)
}

fn read_stream(path: &Path, stats: &mut SinkStats, seen: &mut HashSet<String>) -> SinkResult<()> {
    let reader = BufReader::new(File::open(path)?);

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<CommentRecord>(&line) {
            Ok(record) => {
                stats.total += 1;
                if record.is_reply() {
                    stats.replies += 1;
                } else {
                    stats.top_level += 1;
                }
                seen.insert(record.id().to_string());
            }
            Err(e) => {
                tracing::debug!("Skipping malformed line in {}: {}", path.display(), e);
                stats.malformed += 1;
            }
        }
    }

    Ok(())
}

/// Prints statistics to stdout in a formatted manner
pub fn print_sink_stats(stats: &SinkStats) {
    println!("Records:");
    println!("  Files: {}", stats.files);
    println!("  Total: {}", stats.total);
    println!("  Top-level comments: {}", stats.top_level);
    println!("  Replies: {}", stats.replies);
    println!("  Unique ids: {}", stats.unique);
    println!("  Duplicates: {}", stats.duplicates());
    if stats.malformed > 0 {
        println!("  Malformed lines: {}", stats.malformed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::{comment, thread};
    use crate::sink::{CommentSink, NdjsonSink};
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_counts_duplicates_across_files() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("a.ndjson");
        let second = dir.path().join("b.ndjson");

        let mut sink = NdjsonSink::open(&first).unwrap();
        sink.append(&CommentRecord::top_level(&thread("c1", 1, 1), "vid"))
            .unwrap();
        sink.append(&CommentRecord::reply(&comment("c1.e0", Some("c1")), "c1"))
            .unwrap();
        sink.flush().unwrap();

        let mut sink = NdjsonSink::open(&second).unwrap();
        sink.append(&CommentRecord::top_level(&thread("c1", 1, 1), "vid"))
            .unwrap();
        sink.append(&CommentRecord::top_level(&thread("c2", 0, 0), "vid"))
            .unwrap();
        sink.flush().unwrap();

        let stats = load_sink_stats(&[first, second]).unwrap();
        assert_eq!(stats.files, 2);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.top_level, 3);
        assert_eq!(stats.replies, 1);
        assert_eq!(stats.unique, 3);
        assert_eq!(stats.duplicates(), 1);
    }

    #[test]
    fn test_truncated_line_is_counted_not_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cut.ndjson");

        let mut sink = NdjsonSink::open(&path).unwrap();
        sink.append(&CommentRecord::top_level(&thread("c1", 0, 0), "vid"))
            .unwrap();
        sink.flush().unwrap();
        drop(sink);

        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap();
        write!(file, "{{\"id\":\"c2\",\"chan").unwrap();

        let stats = load_sink_stats(&[path]).unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.malformed, 1);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(load_sink_stats(&[dir.path().join("nope.ndjson")]).is_err());
    }
}
