//! Crawler module for quota-governed comment harvesting
//!
//! This module contains the core crawling logic, including:
//! - Bounded cursor pagination shared by every listing
//! - The per-video harvest with nested reply walks
//! - The session driver over the checkpoint
//! - Channel discovery (handle resolution, uploads, playlists)
//! - Cooperative cancellation and the per-session log context

mod discovery;
mod driver;
mod harvester;
mod pagination;
mod session;
mod signal;

pub use discovery::{register_uploads, resolve_channel, save_channel_playlists, DiscoveryReport};
pub use driver::{CrawlDriver, SessionSummary, StopReason};
pub use harvester::{CommentHarvester, HarvestOutcome, HarvestStatus, DEFAULT_REPLY_THRESHOLD};
pub use pagination::{collect_all, PaginatedWalk, WalkOutcome, WalkPage};
pub use session::SessionContext;
pub use signal::{listen_for_shutdown, StopSignal};
