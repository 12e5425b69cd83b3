//! Per-video comment harvest
//!
//! A harvest walks a video's comment thread pages from a resume cursor,
//! emitting every top-level comment and every reply, and stops at the first
//! of: the last page, the unit allotment, quota exhaustion, a stop request or
//! an error. Threads declaring more replies than the threshold get a nested
//! reply walk that shares the same allotment; the rest use the replies the
//! service inlined at no extra cost.
//!
//! If a nested reply walk cannot finish, the harvest stops and resumes later
//! at the *current* thread page, so that page's records may be emitted twice.
//! Past the current page nothing is ever skipped.

use crate::client::{CommentService, PageToken};
use crate::crawler::pagination::PaginatedWalk;
use crate::crawler::StopSignal;
use crate::quota::QuotaBudget;
use crate::sink::{CommentRecord, CommentSink};
use crate::HarvestError;

/// Declared reply count above which replies are fetched separately
pub const DEFAULT_REPLY_THRESHOLD: u64 = 5;

/// Why a harvest returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestStatus {
    /// Every page of the video was fetched
    Complete,

    /// The allotment ran out; resume from `next_cursor`
    Partial,

    /// The service reported its quota spent
    QuotaExhausted,

    /// A stop was requested
    Cancelled,

    /// A non-quota error; the video restarts from its first page next time
    Aborted(String),
}

/// Result of one harvest call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestOutcome {
    pub units_used: u64,
    pub next_cursor: Option<PageToken>,
    pub top_level_count: u64,
    pub reply_count: u64,
    pub status: HarvestStatus,
}

impl HarvestOutcome {
    pub fn done(&self) -> bool {
        self.status == HarvestStatus::Complete
    }

    /// Records emitted
    pub fn records(&self) -> u64 {
        self.top_level_count + self.reply_count
    }
}

#[derive(Debug, Default)]
struct Tally {
    top_level: u64,
    replies: u64,
}

type Stop = (HarvestStatus, Option<PageToken>);

/// Harvests comments for one video at a time into a sink
pub struct CommentHarvester<S, K> {
    service: S,
    sink: K,
    budget: QuotaBudget,
    stop: StopSignal,
    reply_threshold: u64,
}

impl<S: CommentService, K: CommentSink> CommentHarvester<S, K> {
    /// Creates a harvester
    ///
    /// # Arguments
    ///
    /// * `service` - Remote comment service
    /// * `sink` - Destination for emitted records
    /// * `budget` - Shared session budget; only its exhaustion latch is used here
    /// * `stop` - Shared stop flag, checked before every request
    pub fn new(service: S, sink: K, budget: QuotaBudget, stop: StopSignal) -> Self {
        Self {
            service,
            sink,
            budget,
            stop,
            reply_threshold: DEFAULT_REPLY_THRESHOLD,
        }
    }

    pub fn with_reply_threshold(mut self, reply_threshold: u64) -> Self {
        self.reply_threshold = reply_threshold;
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn budget(&self) -> &QuotaBudget {
        &self.budget
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    /// Harvests one video
    ///
    /// # Arguments
    ///
    /// * `video_id` - Video to harvest
    /// * `resume` - Thread page to start from; `None` for the first page
    /// * `allotment` - Most units this call may spend
    ///
    /// # Returns
    ///
    /// The outcome. `units_used` never exceeds `allotment`.
    pub async fn harvest(
        &mut self,
        video_id: &str,
        resume: Option<PageToken>,
        allotment: u64,
    ) -> HarvestOutcome {
        let mut tally = Tally::default();
        let mut threads = PaginatedWalk::new(resume, allotment).with_stop(self.stop.clone());

        let (mut status, mut next_cursor) =
            self.walk_threads(video_id, &mut threads, &mut tally).await;

        if let Err(e) = self.sink.flush() {
            tracing::error!("Failed to flush records for video {}: {}", video_id, e);
            status = HarvestStatus::Aborted(e.to_string());
        }
        if matches!(status, HarvestStatus::Complete | HarvestStatus::Aborted(_)) {
            next_cursor = None;
        }

        tracing::debug!(
            "Harvest of {} ended {:?} after {} units ({} comments, {} replies)",
            video_id,
            status,
            threads.units_used(),
            tally.top_level,
            tally.replies
        );

        HarvestOutcome {
            units_used: threads.units_used(),
            next_cursor,
            top_level_count: tally.top_level,
            reply_count: tally.replies,
            status,
        }
    }

    async fn walk_threads(
        &mut self,
        video_id: &str,
        threads: &mut PaginatedWalk,
        tally: &mut Tally,
    ) -> Stop {
        let allotment = threads.ceiling();

        loop {
            if self.budget.is_exhausted() {
                return (HarvestStatus::QuotaExhausted, threads.cursor().cloned());
            }

            let service = &self.service;
            let fetched = threads
                .next_page(|cursor| async move {
                    service
                        .list_comment_threads(video_id, cursor.as_ref())
                        .await
                })
                .await;

            let page = match fetched {
                Ok(Some(page)) => page,
                Ok(None) if threads.stop_requested() => {
                    return (HarvestStatus::Cancelled, threads.cursor().cloned())
                }
                Ok(None) => return (HarvestStatus::Partial, threads.cursor().cloned()),
                Err(e) => return self.fail(video_id, e.into(), threads.cursor().cloned()),
            };
            tracing::debug!(
                "Video {}: {} threads on page {}",
                video_id,
                page.items.len(),
                page.page_cursor.as_ref().map_or("1", PageToken::as_str)
            );

            for thread in &page.items {
                if let Err(e) = self.sink.append(&CommentRecord::top_level(thread, video_id)) {
                    return self.fail(video_id, e.into(), None);
                }
                tally.top_level += 1;

                if thread.snippet.total_reply_count <= self.reply_threshold {
                    for reply in thread.embedded_replies() {
                        let record = CommentRecord::reply(reply, thread.comment_id());
                        if let Err(e) = self.sink.append(&record) {
                            return self.fail(video_id, e.into(), None);
                        }
                        tally.replies += 1;
                    }
                    continue;
                }

                let mut replies = PaginatedWalk::new(None, allotment - threads.units_used())
                    .with_stop(self.stop.clone());
                let result = self
                    .walk_replies(thread.comment_id(), &mut replies, tally)
                    .await;
                threads.absorb(replies.units_used());

                if let Err(e) = result {
                    return self.fail(video_id, e, page.page_cursor.clone());
                }
                if !replies.is_complete() {
                    let status = if self.budget.is_exhausted() {
                        HarvestStatus::QuotaExhausted
                    } else if replies.stop_requested() {
                        HarvestStatus::Cancelled
                    } else {
                        HarvestStatus::Partial
                    };
                    tracing::warn!(
                        "Replies to {} on video {} incomplete; resuming at this page next time",
                        thread.comment_id(),
                        video_id
                    );
                    return (status, page.page_cursor.clone());
                }
            }

            if let Err(e) = self.sink.flush() {
                return self.fail(video_id, e.into(), None);
            }
            if threads.is_complete() {
                return (HarvestStatus::Complete, None);
            }
        }
    }

    async fn walk_replies(
        &mut self,
        parent_id: &str,
        walk: &mut PaginatedWalk,
        tally: &mut Tally,
    ) -> Result<(), HarvestError> {
        let service = &self.service;

        while !self.budget.is_exhausted() {
            let page = walk
                .next_page(|cursor| async move {
                    service.list_replies(parent_id, cursor.as_ref()).await
                })
                .await?;
            let Some(page) = page else {
                break;
            };

            for reply in &page.items {
                self.sink.append(&CommentRecord::reply(reply, parent_id))?;
                tally.replies += 1;
            }
        }
        Ok(())
    }

    fn fail(&self, video_id: &str, error: HarvestError, cursor: Option<PageToken>) -> Stop {
        match error {
            HarvestError::Service(e) if e.is_quota_exceeded() => {
                self.budget.mark_exhausted();
                (HarvestStatus::QuotaExhausted, cursor)
            }
            e => {
                tracing::error!("Aborting video {}: {}", video_id, e);
                (HarvestStatus::Aborted(e.to_string()), None)
            }
        }
    }
}
