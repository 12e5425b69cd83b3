//! Configuration module for comment-harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and derives the on-disk layout of the data directory.
//!
//! # Example
//!
//! ```no_run
//! use comment_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Session budget: {} units", config.quota.session_units);
//! ```

mod parser;
mod paths;
mod types;
mod validation;

// Re-export types
pub use paths::DataPaths;
pub use types::{
    ApiConfig, ChannelConfig, CheckpointBackend, Config, CrawlerConfig, OutputConfig, QuotaConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
