use crate::config::types::{
    ApiConfig, ChannelConfig, Config, CrawlerConfig, OutputConfig, QuotaConfig,
};
use crate::ConfigError;
use url::Url;

/// Largest page size the Data API accepts for comment resources
const MAX_COMMENT_PAGE_SIZE: u32 = 100;

/// Largest page size the Data API accepts for playlist resources
const MAX_PLAYLIST_PAGE_SIZE: u32 = 50;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_channel_config(&config.channel)?;
    validate_api_config(&config.api)?;
    validate_quota_config(&config.quota)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the channel identity
fn validate_channel_config(config: &ChannelConfig) -> Result<(), ConfigError> {
    match (&config.handle, &config.id) {
        (Some(_), Some(_)) => Err(ConfigError::Validation(
            "channel: set either handle or id, not both".to_string(),
        )),
        (None, None) => Err(ConfigError::Validation(
            "channel: one of handle or id is required".to_string(),
        )),
        (Some(handle), None) => validate_handle(handle),
        (None, Some(id)) => validate_channel_id(id),
    }
}

/// Validates a channel handle, with or without the leading '@'
fn validate_handle(handle: &str) -> Result<(), ConfigError> {
    let bare = handle.strip_prefix('@').unwrap_or(handle);

    if bare.is_empty() {
        return Err(ConfigError::Validation(
            "channel handle cannot be empty".to_string(),
        ));
    }

    if !bare
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(ConfigError::Validation(format!(
            "channel handle contains invalid characters: '{}'",
            handle
        )));
    }

    Ok(())
}

/// Validates a channel id
fn validate_channel_id(id: &str) -> Result<(), ConfigError> {
    if !id.starts_with("UC") || id.len() < 3 {
        return Err(ConfigError::Validation(format!(
            "channel id must start with 'UC', got '{}'",
            id
        )));
    }
    Ok(())
}

/// Validates remote API configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    let loopback = matches!(url.host_str(), Some("localhost") | Some("127.0.0.1"));
    if url.scheme() != "https" && !(url.scheme() == "http" && loopback) {
        return Err(ConfigError::Validation(format!(
            "base-url '{}' must use HTTPS scheme",
            config.base_url
        )));
    }

    if config.api_key_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "api-key-env cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates session budgets
fn validate_quota_config(config: &QuotaConfig) -> Result<(), ConfigError> {
    if config.session_units == 0 {
        return Err(ConfigError::Validation(
            "session-units must be >= 1".to_string(),
        ));
    }

    if config.diagnostic_units == 0 || config.diagnostic_units > config.session_units {
        return Err(ConfigError::Validation(format!(
            "diagnostic-units must be between 1 and session-units ({}), got {}",
            config.session_units, config.diagnostic_units
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.report_every < 1 {
        return Err(ConfigError::Validation(format!(
            "report-every must be >= 1, got {}",
            config.report_every
        )));
    }

    for (name, size) in [
        ("thread-page-size", config.thread_page_size),
        ("reply-page-size", config.reply_page_size),
    ] {
        if size < 1 || size > MAX_COMMENT_PAGE_SIZE {
            return Err(ConfigError::Validation(format!(
                "{} must be between 1 and {}, got {}",
                name, MAX_COMMENT_PAGE_SIZE, size
            )));
        }
    }

    if config.playlist_page_size < 1 || config.playlist_page_size > MAX_PLAYLIST_PAGE_SIZE {
        return Err(ConfigError::Validation(format!(
            "playlist-page-size must be between 1 and {}, got {}",
            MAX_PLAYLIST_PAGE_SIZE, config.playlist_page_size
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.data_dir.is_empty() {
        return Err(ConfigError::Validation(
            "data-dir cannot be empty".to_string(),
        ));
    }
    Ok(())
}
