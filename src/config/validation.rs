use crate::config::types::{
    BrowserConfig, CaptureConfig, Config, CrawlerConfig, ExtractorConfig, OutputConfig,
    SearchConfig,
};
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;
use url::Url;

/// Upper bound on the lead quota accepted from config or the command line
pub const MAX_LEAD_QUOTA: u32 = 200;

/// Upper bound on concurrent browser sessions
pub const MAX_WORKERS: u32 = 8;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_search_config(&config.search)?;
    validate_browser_config(&config.browser)?;
    validate_extractor_config(&config.extractor)?;
    validate_capture_config(&config.capture)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates a lead quota
pub fn validate_quota(quota: u32) -> Result<(), ConfigError> {
    if quota < 1 || quota > MAX_LEAD_QUOTA {
        return Err(ConfigError::Validation(format!(
            "max_leads must be between 1 and {}, got {}",
            MAX_LEAD_QUOTA, quota
        )));
    }
    Ok(())
}

/// Validates a worker count
pub fn validate_workers(workers: u32) -> Result<(), ConfigError> {
    if workers < 1 || workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, workers
        )));
    }
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_quota(config.max_leads)?;
    validate_workers(config.workers)?;

    if config.fetch_timeout_secs < 1 || config.fetch_timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout_secs must be between 1 and 300, got {}",
            config.fetch_timeout_secs
        )));
    }

    // The settle delay is spent inside the per-URL budget
    if config.settle_delay_ms >= config.fetch_timeout_secs * 1000 {
        return Err(ConfigError::Validation(format!(
            "settle_delay_ms ({}ms) must be shorter than fetch_timeout_secs ({}s)",
            config.settle_delay_ms, config.fetch_timeout_secs
        )));
    }

    Ok(())
}

/// Validates search backend configuration
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    let endpoint = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid search endpoint: {}", e)))?;

    if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Search endpoint '{}' must use HTTP or HTTPS",
            config.endpoint
        )));
    }

    Selector::parse(&config.result_selector).map_err(|e| {
        ConfigError::InvalidPattern(format!(
            "Invalid result selector '{}': {:?}",
            config.result_selector, e
        ))
    })?;

    if config.redirect_param.is_empty() {
        return Err(ConfigError::Validation(
            "redirect_param cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "search timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}

/// Validates browser launch configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.window_width == 0 || config.window_height == 0 {
        return Err(ConfigError::Validation(format!(
            "window size must be non-zero, got {}x{}",
            config.window_width, config.window_height
        )));
    }

    if let Some(executable) = &config.executable {
        if executable.is_empty() {
            return Err(ConfigError::Validation(
                "executable cannot be an empty path".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates extraction patterns
fn validate_extractor_config(config: &ExtractorConfig) -> Result<(), ConfigError> {
    validate_capturing_pattern("phone_pattern", &config.phone_pattern)?;
    validate_capturing_pattern("handle_pattern", &config.handle_pattern)?;

    if config.email_blacklist.iter().any(|entry| entry.is_empty()) {
        return Err(ConfigError::Validation(
            "email_blacklist entries cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Checks that a pattern compiles and has the capture group the extractor reads
fn validate_capturing_pattern(name: &str, pattern: &str) -> Result<(), ConfigError> {
    let regex = Regex::new(pattern)
        .map_err(|e| ConfigError::InvalidPattern(format!("Invalid {}: {}", name, e)))?;

    if regex.captures_len() < 2 {
        return Err(ConfigError::InvalidPattern(format!(
            "{} must contain a capture group, got '{}'",
            name, pattern
        )));
    }

    Ok(())
}

/// Validates capture configuration
fn validate_capture_config(config: &CaptureConfig) -> Result<(), ConfigError> {
    if config.frames_dir.is_empty() {
        return Err(ConfigError::Validation(
            "frames_dir cannot be empty".to_string(),
        ));
    }

    if config.video_path.is_empty() {
        return Err(ConfigError::Validation(
            "video_path cannot be empty".to_string(),
        ));
    }

    if config.frame_rate < 1 || config.frame_rate > 60 {
        return Err(ConfigError::Validation(format!(
            "frame_rate must be between 1 and 60, got {}",
            config.frame_rate
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.leads_path.is_empty() {
        return Err(ConfigError::Validation(
            "leads_path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
