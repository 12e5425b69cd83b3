use serde::Deserialize;

/// Main configuration structure for comment-harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub channel: ChannelConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    pub output: OutputConfig,
}

/// Identity of the channel being harvested
///
/// Exactly one of `handle` or `id` must be set. A handle is resolved to a
/// channel id through the API, which costs one unit.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    /// Public handle, with or without the leading '@'
    pub handle: Option<String>,

    /// Channel id (starts with "UC")
    pub id: Option<String>,
}

impl ChannelConfig {
    /// Label used in file names: the handle without '@', or the channel id
    pub fn label(&self) -> &str {
        match (&self.handle, &self.id) {
            (Some(handle), _) => handle.trim_start_matches('@'),
            (None, Some(id)) => id,
            (None, None) => "channel",
        }
    }
}

/// Remote API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the Data API
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Name of the environment variable holding the API key
    #[serde(rename = "api-key-env", default = "default_api_key_env")]
    pub api_key_env: String,

    /// Fixed delay inserted before every request (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            request_delay_ms: default_request_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Session unit budget
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaConfig {
    /// Units available to a production session
    #[serde(rename = "session-units", default = "default_session_units")]
    pub session_units: u64,

    /// Units available to a diagnostic session
    #[serde(rename = "diagnostic-units", default = "default_diagnostic_units")]
    pub diagnostic_units: u64,
}

impl QuotaConfig {
    /// Returns the allotment for a session
    pub fn units_for(&self, diagnostic: bool) -> u64 {
        if diagnostic {
            self.diagnostic_units
        } else {
            self.session_units
        }
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            session_units: default_session_units(),
            diagnostic_units: default_diagnostic_units(),
        }
    }
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Declared reply count above which replies are fetched separately
    #[serde(rename = "reply-threshold", default = "default_reply_threshold")]
    pub reply_threshold: u64,

    /// Report progress after every N videos processed
    #[serde(rename = "report-every", default = "default_report_every")]
    pub report_every: u32,

    /// Page size for comment thread requests
    #[serde(rename = "thread-page-size", default = "default_comment_page_size")]
    pub thread_page_size: u32,

    /// Page size for reply requests
    #[serde(rename = "reply-page-size", default = "default_comment_page_size")]
    pub reply_page_size: u32,

    /// Page size for playlist and playlist item requests
    #[serde(rename = "playlist-page-size", default = "default_playlist_page_size")]
    pub playlist_page_size: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            reply_threshold: default_reply_threshold(),
            report_every: default_report_every(),
            thread_page_size: default_comment_page_size(),
            reply_page_size: default_comment_page_size(),
            playlist_page_size: default_playlist_page_size(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root of the data directory tree
    #[serde(rename = "data-dir")]
    pub data_dir: String,

    /// Where per-video progress is kept
    #[serde(rename = "checkpoint-backend", default)]
    pub checkpoint_backend: CheckpointBackend,
}

/// Checkpoint storage backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointBackend {
    /// JSON document replaced atomically after every video
    #[default]
    Json,

    /// SQLite database
    Sqlite,
}

fn default_base_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_api_key_env() -> String {
    "YOUTUBE_API_KEY".to_string()
}

fn default_request_delay_ms() -> u64 {
    1
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_session_units() -> u64 {
    9900
}

fn default_diagnostic_units() -> u64 {
    10
}

fn default_reply_threshold() -> u64 {
    5
}

fn default_report_every() -> u32 {
    1
}

fn default_comment_page_size() -> u32 {
    100
}

fn default_playlist_page_size() -> u32 {
    50
}
