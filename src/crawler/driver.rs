//! Session driver
//!
//! Iterates the pending videos in checkpoint order, harvesting each under
//! the remaining session budget, and records progress after every video.

use crate::checkpoint::{CheckpointResult, CheckpointStore};
use crate::client::CommentService;
use crate::crawler::harvester::{CommentHarvester, HarvestOutcome, HarvestStatus};
use crate::crawler::session::SessionContext;
use crate::crawler::StopSignal;
use crate::quota::{QuotaBudget, Remaining};
use crate::sink::CommentSink;
use crate::HarvestError;
use std::fmt;
use std::time::Duration;
use tracing::Instrument;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every registered video is done
    AllVideosDone,

    /// Each pending video was attempted once; some were aborted and remain pending
    PassComplete,

    /// The session allotment is spent
    BudgetDepleted,

    /// The service reported its quota spent
    QuotaExhausted,

    /// A stop was requested
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::AllVideosDone => "all videos done",
            Self::PassComplete => "every pending video attempted",
            Self::BudgetDepleted => "session budget depleted",
            Self::QuotaExhausted => "service quota exhausted",
            Self::Cancelled => "cancelled",
        };
        f.write_str(reason)
    }
}

/// Totals for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub videos_processed: u64,
    pub videos_completed: u64,

    /// Videos already done before the session started
    pub videos_skipped: u64,

    pub videos_aborted: u64,
    pub top_level_comments: u64,
    pub replies: u64,
    pub units_used: u64,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

impl SessionSummary {
    fn new(videos_skipped: u64) -> Self {
        Self {
            videos_processed: 0,
            videos_completed: 0,
            videos_skipped,
            videos_aborted: 0,
            top_level_comments: 0,
            replies: 0,
            units_used: 0,
            stop_reason: StopReason::PassComplete,
            elapsed: Duration::ZERO,
        }
    }

    fn record(&mut self, outcome: &HarvestOutcome) {
        self.videos_processed += 1;
        if outcome.done() {
            self.videos_completed += 1;
        }
        if matches!(outcome.status, HarvestStatus::Aborted(_)) {
            self.videos_aborted += 1;
        }
        self.top_level_comments += outcome.top_level_count;
        self.replies += outcome.reply_count;
        self.units_used += outcome.units_used;
    }
}

/// Drives one crawl session over the checkpoint
pub struct CrawlDriver<S, K, C> {
    context: SessionContext,
    harvester: CommentHarvester<S, K>,
    store: C,
    report_every: u32,
}

impl<S, K, C> CrawlDriver<S, K, C>
where
    S: CommentService,
    K: CommentSink,
    C: CheckpointStore,
{
    /// Creates a driver
    ///
    /// The session budget and stop flag are the harvester's.
    pub fn new(
        context: SessionContext,
        harvester: CommentHarvester<S, K>,
        store: C,
        report_every: u32,
    ) -> Self {
        Self {
            context,
            harvester,
            store,
            report_every: report_every.max(1),
        }
    }

    pub fn harvester(&self) -> &CommentHarvester<S, K> {
        &self.harvester
    }

    pub fn store(&self) -> &C {
        &self.store
    }

    pub fn into_store(self) -> C {
        self.store
    }

    fn budget(&self) -> &QuotaBudget {
        self.harvester.budget()
    }

    fn stop(&self) -> &StopSignal {
        self.harvester.stop_signal()
    }

    /// Runs the session
    ///
    /// The checkpoint is persisted once more on every exit path.
    ///
    /// # Returns
    ///
    /// * `Ok(SessionSummary)` - Session ended for one of the `StopReason`s
    /// * `Err(HarvestError)` - The checkpoint could not be read
    pub async fn run(&mut self) -> Result<SessionSummary, HarvestError> {
        let span = self.context.span().clone();

        async {
            tracing::info!("Session started with {}", self.budget().remaining());
            let result = self.crawl_pending().await;

            if let Err(e) = self.store.persist() {
                tracing::error!("Final checkpoint persist failed: {}", e);
            }

            let mut summary = result?;
            summary.elapsed = self.context.elapsed();
            log_summary(&summary);
            Ok::<_, HarvestError>(summary)
        }
        .instrument(span)
        .await
    }

    async fn crawl_pending(&mut self) -> Result<SessionSummary, HarvestError> {
        let progress = self.store.progress()?;
        let pending = self.store.pending_videos()?;
        let mut summary = SessionSummary::new(progress.done as u64);

        tracing::info!(
            "{} videos pending ({} half-way), {} already done",
            pending.len(),
            progress.half_way,
            progress.done
        );

        for video in pending {
            if self.stop().is_stop_requested() {
                summary.stop_reason = StopReason::Cancelled;
                return Ok(summary);
            }
            let allotment = match self.budget().remaining() {
                Remaining::Exhausted => {
                    summary.stop_reason = StopReason::QuotaExhausted;
                    return Ok(summary);
                }
                Remaining::Units(0) => {
                    summary.stop_reason = StopReason::BudgetDepleted;
                    return Ok(summary);
                }
                Remaining::Units(units) => units,
            };

            if let Some(cursor) = &video.resume_cursor {
                tracing::info!("Resuming video {} from page {}", video.video_id, cursor);
            }

            let outcome = self
                .harvester
                .harvest(&video.video_id, video.resume_cursor.clone(), allotment)
                .await;
            self.budget().charge(outcome.units_used);
            summary.record(&outcome);

            if let Err(e) = self.save_progress(&video.video_id, &outcome) {
                tracing::error!("Failed to save progress for video {}: {}", video.video_id, e);
            }
            self.report(&video.video_id, &outcome, &summary);

            match outcome.status {
                HarvestStatus::QuotaExhausted => {
                    summary.stop_reason = StopReason::QuotaExhausted;
                    return Ok(summary);
                }
                HarvestStatus::Cancelled => {
                    summary.stop_reason = StopReason::Cancelled;
                    return Ok(summary);
                }
                _ => {}
            }
        }

        summary.stop_reason = if self.store.pending_videos()?.is_empty() {
            StopReason::AllVideosDone
        } else if self.budget().is_depleted() {
            StopReason::BudgetDepleted
        } else {
            StopReason::PassComplete
        };
        Ok(summary)
    }

    fn save_progress(&mut self, video_id: &str, outcome: &HarvestOutcome) -> CheckpointResult<()> {
        self.store
            .record_progress(video_id, outcome.next_cursor.clone(), outcome.done())?;
        self.store.persist()
    }

    fn report(&self, video_id: &str, outcome: &HarvestOutcome, summary: &SessionSummary) {
        if self.report_every == 1 {
            tracing::info!(
                "Video {} processed. Finished: {}. Comments: {}, Replies: {}, Units: {}",
                video_id,
                outcome.done(),
                outcome.top_level_count,
                outcome.reply_count,
                outcome.units_used
            );
        } else if summary.videos_processed % u64::from(self.report_every) == 0 {
            tracing::info!(
                "{} videos processed ({}s). Comments: {}, Replies: {}, Units: {}",
                summary.videos_processed,
                self.context.elapsed().as_secs(),
                summary.top_level_comments,
                summary.replies,
                summary.units_used
            );
        }
    }
}

fn log_summary(summary: &SessionSummary) {
    tracing::info!(
        "Session ended ({}): {} videos processed, {} completed, {} skipped, {} aborted",
        summary.stop_reason,
        summary.videos_processed,
        summary.videos_completed,
        summary.videos_skipped,
        summary.videos_aborted
    );
    tracing::info!(
        "Comments: {}, Replies: {}, Units: {}, Elapsed: {:.1}s",
        summary.top_level_comments,
        summary.replies,
        summary.units_used,
        summary.elapsed.as_secs_f64()
    );
}
