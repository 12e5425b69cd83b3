//! Per-session logging context
//!
//! A `SessionContext` is created once per crawl session and handed to the
//! driver, which runs the whole session inside its span. Every log line the
//! harvester and checkpoint emit during the session carries the channel.

use std::time::{Duration, Instant};
use tracing::Span;

#[derive(Debug, Clone)]
pub struct SessionContext {
    channel: String,
    started: Instant,
    span: Span,
}

impl SessionContext {
    pub fn new(channel: impl Into<String>) -> Self {
        let channel = channel.into();
        let span = tracing::info_span!("session", channel = %channel);
        Self {
            channel,
            started: Instant::now(),
            span,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Time since the session started
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
