//! Lead Harvester: keyword-driven contact discovery
//!
//! This crate searches for pages relevant to a keyword, renders each candidate
//! page in a headless browser, and extracts contact channels (emails, phone
//! numbers, messaging handles) into a deduplicated lead table.

pub mod browser;
pub mod capture;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Lead Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser error: {0}")]
    Browser(#[from] browser::BrowserError),

    #[error("Failed to persist lead table: {0}")]
    Persistence(#[source] output::OutputError),

    #[error("Invalid scan request: {0}")]
    InvalidRequest(String),
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

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Lead Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_scan, ScanRequest};
pub use extract::{ExtractedEntities, Extractor};
pub use state::{CandidateUrl, LeadRecord, LeadStatus, PageSnapshot};
pub use url::normalize_url;
