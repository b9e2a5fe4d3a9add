//! Configuration module for Lead Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use lead_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvester.toml")).unwrap();
//! println!("Fetch timeout: {}s", config.crawler.fetch_timeout_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, CaptureConfig, Config, CrawlerConfig, ExtractorConfig, OutputConfig,
    SearchConfig, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, validate_quota, validate_workers, MAX_LEAD_QUOTA, MAX_WORKERS};
