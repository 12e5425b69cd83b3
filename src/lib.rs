//! comment-harvest: a quota-governed, resumable comment crawler
//!
//! This crate walks a channel's uploaded videos and harvests every comment
//! thread and reply through the YouTube Data API, under a hard per-session
//! unit budget. Progress is checkpointed per video so an interrupted or
//! budget-limited session resumes exactly where the previous one stopped.

pub mod checkpoint;
pub mod client;
pub mod config;
pub mod crawler;
pub mod quota;
pub mod sink;

use thiserror::Error;

/// Main error type for comment-harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Service error: {0}")]
    Service(#[from] client::ServiceError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] checkpoint::CheckpointError),

    #[error("Sink error: {0}")]
    Sink(#[from] sink::SinkError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Refusing to overwrite existing file: {0}")]
    AlreadyExists(String),

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("Session budget depleted")]
    BudgetDepleted,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("API key environment variable '{0}' is not set")]
    MissingApiKey(String),
}

/// Result type alias for comment-harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use checkpoint::{CheckpointStore, VideoRecord};
pub use client::{CommentService, PageToken, YouTubeClient};
pub use config::Config;
pub use crawler::{CommentHarvester, CrawlDriver, HarvestOutcome, SessionSummary};
pub use quota::QuotaBudget;
pub use sink::{CommentRecord, CommentSink, NdjsonSink};
