use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Sections and keys missing from the file keep their defaults.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use lead_harvester::config::load_config;
///
/// let config = load_config(Path::new("harvester.toml")).unwrap();
/// println!("Lead quota: {}", config.crawler.max_leads);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is recorded in the run summary so a lead table can be traced back
/// to the settings that produced it.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(hash_content(&content))
}

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Loads a configuration and returns both the config and its hash
///
/// Without a path the built-in defaults are used and the hash is computed
/// over an empty document.
pub fn load_config_with_hash(path: Option<&Path>) -> Result<(Config, String), ConfigError> {
    match path {
        Some(path) => {
            let config = load_config(path)?;
            let hash = compute_config_hash(path)?;
            Ok((config, hash))
        }
        None => Ok((Config::default(), hash_content(""))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[crawler]
max-leads = 25
workers = 2
fetch-timeout-secs = 15
settle-delay-ms = 500

[search]
endpoint = "https://search.test/html/"

[browser]
window-width = 1920
window-height = 1080

[extractor]
email-blacklist = [".gif", "placeholder"]

[capture]
enabled = true
frames-dir = "./frames"

[output]
leads-path = "./leads.csv"
summary-path = "./summary.md"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_leads, 25);
        assert_eq!(config.crawler.workers, 2);
        assert_eq!(config.crawler.settle_delay_ms, 500);
        assert_eq!(config.search.endpoint, "https://search.test/html/");
        assert_eq!(config.search.result_selector, "a.result__a");
        assert_eq!(config.browser.window_width, 1920);
        assert!(config.browser.headless);
        assert_eq!(config.extractor.email_blacklist.len(), 2);
        assert!(config.capture.enabled);
        assert_eq!(config.capture.frame_rate, 2);
        assert_eq!(config.output.leads_path, "./leads.csv");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();

        assert_eq!(config.crawler.max_leads, 50);
        assert_eq!(config.crawler.fetch_timeout_secs, 10);
        assert_eq!(config.search.redirect_param, "uddg");
        assert!(!config.capture.enabled);
        assert_eq!(config.output.leads_path, "leads_database.csv");
    }

    #[test]
    fn test_sample_config_matches_defaults() {
        let sample = parse_config(include_str!("../../harvester.toml")).unwrap();
        let defaults = Config::default();

        assert_eq!(sample.crawler.max_leads, defaults.crawler.max_leads);
        assert_eq!(sample.search.endpoint, defaults.search.endpoint);
        assert_eq!(sample.browser.user_agent, defaults.browser.user_agent);
        assert_eq!(sample.extractor.phone_pattern, defaults.extractor.phone_pattern);
        assert_eq!(sample.extractor.handle_pattern, defaults.extractor.handle_pattern);
        assert_eq!(sample.capture.frames_dir, defaults.capture.frames_dir);
        assert_eq!(sample.output.summary_path, defaults.output.summary_path);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/harvester.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[crawler]
max-leads = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_defaults_without_path() {
        let (config, hash) = load_config_with_hash(None).unwrap();
        assert_eq!(config.crawler.workers, 1);
        assert_eq!(hash, hash_content(""));
    }
}
